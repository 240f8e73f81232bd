use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    rules::{
        defense::{DefenseParams, DefensePowerModel},
        special::{HpScaledDamage, ProtectionDamageModel, ScratchDamageModel},
    },
    statistics::{distribution::ProbabilityDistribution, roller::Roller},
};

fn default_remaining_ammo_modifier() -> f64 {
    1.0
}

/// The parts of an attack that stay fixed across a salvo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageModifiers {
    #[serde(default = "default_remaining_ammo_modifier")]
    pub remaining_ammo_modifier: f64,
    #[serde(default)]
    pub armor_penetration: f64,
}

impl Default for DamageModifiers {
    fn default() -> Self {
        Self {
            remaining_ammo_modifier: 1.0,
            armor_penetration: 0.0,
        }
    }
}

impl DamageModifiers {
    pub fn with_attack_term(self, attack_term: f64) -> DamageParams {
        DamageParams {
            attack_term,
            remaining_ammo_modifier: self.remaining_ammo_modifier,
            armor_penetration: self.armor_penetration,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let ammo = self.remaining_ammo_modifier;
        if !(ammo > 0.0 && ammo <= 1.0) {
            return Err(ValidationError::InvalidAmmoModifier(ammo));
        }
        let penetration = self.armor_penetration;
        if !penetration.is_finite() || penetration < 0.0 {
            return Err(ValidationError::InvalidArmorPenetration(penetration));
        }
        Ok(())
    }
}

/// One attack instance against a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageParams {
    pub attack_term: f64,
    #[serde(default = "default_remaining_ammo_modifier")]
    pub remaining_ammo_modifier: f64,
    #[serde(default)]
    pub armor_penetration: f64,
}

impl DamageParams {
    pub fn new(attack_term: f64) -> Self {
        DamageModifiers::default().with_attack_term(attack_term)
    }

    pub fn remaining_ammo_modifier(mut self, modifier: f64) -> Self {
        self.remaining_ammo_modifier = modifier;
        self
    }

    pub fn armor_penetration(mut self, penetration: f64) -> Self {
        self.armor_penetration = penetration;
        self
    }

    pub fn modifiers(&self) -> DamageModifiers {
        DamageModifiers {
            remaining_ammo_modifier: self.remaining_ammo_modifier,
            armor_penetration: self.armor_penetration,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.attack_term.is_finite() {
            return Err(ValidationError::NonFiniteAttackTerm(self.attack_term));
        }
        // damage never exceeds the attack term, so this keeps it within u32
        if self.attack_term > u32::MAX as f64 {
            return Err(ValidationError::AttackTermTooLarge(self.attack_term));
        }
        self.modifiers().validate()
    }
}

/// Damage distribution of a single attack.
///
/// Outcomes are resolved in this order:
/// 1. computed damage of zero becomes scratch damage;
/// 2. damage below the current HP, or any damage on a sinkable target, is
///    dealt as computed;
/// 3. a lethal blow on an unsinkable, protected target becomes protection
///    damage;
/// 4. any other lethal blow on an unsinkable target leaves it at 1 HP.
#[derive(Debug, Clone)]
pub struct SingleAttackDamageModel {
    damage: DamageParams,
    defense: DefenseParams,
    defense_power: DefensePowerModel,
    scratch: ScratchDamageModel,
    protection: ProtectionDamageModel,
}

impl SingleAttackDamageModel {
    pub fn new(damage: DamageParams, defense: DefenseParams) -> Result<Self, ValidationError> {
        damage.validate()?;
        defense.validate()?;
        Ok(Self {
            damage,
            defense,
            defense_power: DefensePowerModel::from_params(&defense)?,
            scratch: ScratchDamageModel::new(defense.current_hp)?,
            protection: ProtectionDamageModel::new(defense.current_hp)?,
        })
    }

    pub fn damage(&self) -> &DamageParams {
        &self.damage
    }

    pub fn defense(&self) -> &DefenseParams {
        &self.defense
    }

    pub fn defense_power(&self) -> &DefensePowerModel {
        &self.defense_power
    }

    pub fn scratch(&self) -> &ScratchDamageModel {
        &self.scratch
    }

    pub fn protection(&self) -> &ProtectionDamageModel {
        &self.protection
    }

    /// Damage before any of the special-case policies apply.
    pub fn unmodified_damage(&self, defense_roll: f64) -> u32 {
        let effective_defense = (defense_roll - self.damage.armor_penetration).max(1.0);
        let raw = ((self.damage.attack_term - effective_defense)
            * self.damage.remaining_ammo_modifier)
            .floor();
        if raw > 0.0 { raw as u32 } else { 0 }
    }

    pub fn is_normal_damage(&self, value: u32) -> bool {
        value > 0 && (self.defense.sinkable || value < self.defense.current_hp)
    }

    pub fn to_distribution(&self) -> ProbabilityDistribution<u32> {
        let current_hp = self.defense.current_hp;
        let unmodified: Vec<u32> = self
            .defense_power
            .values()
            .into_iter()
            .map(|roll| self.unmodified_damage(roll))
            .collect();
        let parameter = unmodified.len() as f64;

        let scratch_probability =
            unmodified.iter().filter(|&&v| v == 0).count() as f64 / parameter;
        let overkill_probability =
            unmodified.iter().filter(|&&v| v >= current_hp).count() as f64 / parameter;

        let normal = ProbabilityDistribution::count(
            unmodified
                .iter()
                .copied()
                .filter(|&v| self.is_normal_damage(v)),
        );

        normal.batch(|b| {
            b.multiply(1.0 / parameter);
            if scratch_probability > 0.0 {
                b.add_distribution(&self.scratch.to_distribution().multiply(scratch_probability));
            }
            if self.defense.sinkable || overkill_probability <= 0.0 {
                return;
            }
            if self.defense.protection {
                b.add_distribution(
                    &self
                        .protection
                        .to_distribution()
                        .multiply(overkill_probability),
                );
            } else {
                b.add(current_hp - 1, overkill_probability);
            }
        })
    }

    /// One sampled outcome, resolved with the same policies as
    /// [`SingleAttackDamageModel::to_distribution`].
    pub fn random(&self, roller: &mut Roller) -> u32 {
        let defense_roll = self.defense_power.random_draw(roller);
        let value = self.unmodified_damage(defense_roll);
        if value == 0 {
            self.scratch.random(roller)
        } else if self.is_normal_damage(value) {
            value
        } else if self.defense.protection {
            self.protection.random(roller)
        } else {
            self.defense.current_hp - 1
        }
    }
}
