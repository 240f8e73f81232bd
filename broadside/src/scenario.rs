use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    rules::{
        damage::{DamageModifiers, SingleAttackDamageModel},
        defense::DefenseParams,
        salvo::{AttackTerms, HitRate, SalvoDamageModel},
    },
};

fn default_count() -> u32 {
    1
}

/// Everything needed to resolve one attacker's salvo against one target, as
/// read from a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub defense: DefenseParams,
    #[serde(default)]
    pub modifiers: DamageModifiers,
    pub attack: AttackTerms,
    pub hit_rate: HitRate,
    #[serde(default = "default_count")]
    pub count: u32,
}

impl Scenario {
    /// A two-shot salvo against a lightly armored, protected target.
    pub fn demo() -> Self {
        Self {
            defense: DefenseParams::new(48, 37)
                .improvement_bonus(1.5)
                .protection(true)
                .sinkable(false),
            modifiers: DamageModifiers::default(),
            attack: AttackTerms {
                normal: 72.0,
                critical: 108.0,
            },
            hit_rate: HitRate {
                normal: 0.62,
                critical: 0.18,
            },
            count: 2,
        }
    }

    pub fn salvo_model(&self) -> Result<SalvoDamageModel, ValidationError> {
        SalvoDamageModel::new(
            self.count,
            self.attack,
            self.modifiers,
            self.hit_rate,
            self.defense,
        )
    }

    /// The first attack of the salvo, as a normal or a critical hit.
    pub fn single_attack_model(
        &self,
        critical: bool,
    ) -> Result<SingleAttackDamageModel, ValidationError> {
        let attack_term = if critical {
            self.attack.critical
        } else {
            self.attack.normal
        };
        SingleAttackDamageModel::new(self.modifiers.with_attack_term(attack_term), self.defense)
    }
}
