use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    rules::{
        damage::{DamageModifiers, SingleAttackDamageModel},
        defense::DefenseParams,
    },
    statistics::{
        distribution::{DistributionBuilder, ProbabilityDistribution},
        roller::Roller,
    },
};

/// Attack terms of a normal and of a critical hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackTerms {
    pub normal: f64,
    pub critical: f64,
}

/// Per-attack probabilities of a normal and of a critical hit. Whatever is
/// left over is the miss rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRate {
    pub normal: f64,
    pub critical: f64,
}

impl HitRate {
    // rates that arrive as sums of other rates may overshoot 1 by rounding
    const SUM_TOLERANCE: f64 = 1e-9;

    pub fn new(normal: f64, critical: f64) -> Result<Self, ValidationError> {
        let rate = Self { normal, critical };
        rate.validate()?;
        Ok(rate)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [("normal", self.normal), ("critical", self.critical)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::RateOutOfRange { name, value });
            }
        }
        if self.normal + self.critical > 1.0 + Self::SUM_TOLERANCE {
            return Err(ValidationError::RateSumExceedsOne {
                normal: self.normal,
                critical: self.critical,
            });
        }
        Ok(())
    }

    pub fn miss(&self) -> f64 {
        (1.0 - (self.normal + self.critical)).max(0.0)
    }
}

/// Total damage of `count` attacks resolved in order against one target.
///
/// Each attack is evaluated against the HP left by the attacks before it, so
/// the scratch, protection and unsinkable thresholds move as the target is
/// worn down. A target that reaches 0 HP takes no further damage.
#[derive(Debug, Clone)]
pub struct SalvoDamageModel {
    count: u32,
    attack: AttackTerms,
    modifiers: DamageModifiers,
    hit_rate: HitRate,
    defense: DefenseParams,
}

impl SalvoDamageModel {
    pub fn new(
        count: u32,
        attack: AttackTerms,
        modifiers: DamageModifiers,
        hit_rate: HitRate,
        defense: DefenseParams,
    ) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::ZeroCount);
        }
        hit_rate.validate()?;
        defense.validate()?;
        modifiers.with_attack_term(attack.normal).validate()?;
        modifiers.with_attack_term(attack.critical).validate()?;
        // every hit before the lethal one stays below the current HP, and
        // nothing lands after it, so a salvo never deals more than this
        let attack_term = attack.normal.max(attack.critical);
        if defense.current_hp as f64 + attack_term > u32::MAX as f64 {
            return Err(ValidationError::SalvoDamageOverflow {
                current_hp: defense.current_hp,
                attack_term,
            });
        }
        Ok(Self {
            count,
            attack,
            modifiers,
            hit_rate,
            defense,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn attack(&self) -> &AttackTerms {
        &self.attack
    }

    pub fn hit_rate(&self) -> &HitRate {
        &self.hit_rate
    }

    pub fn defense(&self) -> &DefenseParams {
        &self.defense
    }

    /// Single-attack models for a normal and a critical hit at `current_hp`.
    pub fn attack_models(
        &self,
        current_hp: u32,
    ) -> Result<(SingleAttackDamageModel, SingleAttackDamageModel), ValidationError> {
        let defense = self.defense.with_current_hp(current_hp);
        let normal = SingleAttackDamageModel::new(
            self.modifiers.with_attack_term(self.attack.normal),
            defense,
        )?;
        let critical = SingleAttackDamageModel::new(
            self.modifiers.with_attack_term(self.attack.critical),
            defense,
        )?;
        Ok((normal, critical))
    }

    /// Damage distribution of one attack of the salvo at `current_hp`,
    /// misses included. Zero-weight outcomes are dropped.
    pub fn per_hit_distribution(
        &self,
        current_hp: u32,
    ) -> Result<ProbabilityDistribution<u32>, ValidationError> {
        if current_hp == 0 {
            return Ok(ProbabilityDistribution::point(0, 1.0));
        }
        let (normal, critical) = self.attack_models(current_hp)?;
        let normal = normal.to_distribution().multiply(self.hit_rate.normal);
        let critical = critical.to_distribution().multiply(self.hit_rate.critical);
        Ok(normal.batch(|b| {
            b.add_distribution(&critical)
                .add(0, self.hit_rate.miss())
                .retain(|_, w| w > 0.0);
        }))
    }

    pub fn to_distribution(&self) -> Result<ProbabilityDistribution<u32>, ValidationError> {
        let mut solver = SalvoSolver::new(self);
        let result = solver.solve(self.defense.current_hp, self.count)?;
        log::debug!(
            "Resolved {}-attack salvo against {} HP: {} outcomes from {} memoized states",
            self.count,
            self.defense.current_hp,
            result.len(),
            solver.memoized_states()
        );
        Ok(result)
    }

    /// One sampled salvo.
    pub fn random(&self, roller: &mut Roller) -> Result<u32, ValidationError> {
        let mut current_hp = self.defense.current_hp;
        let mut total = 0;
        for _ in 0..self.count {
            if current_hp == 0 {
                break;
            }
            let (normal, critical) = self.attack_models(current_hp)?;
            let draw = roller.unit();
            let damage = if draw < self.hit_rate.normal {
                normal.random(roller)
            } else if draw < self.hit_rate.normal + self.hit_rate.critical {
                critical.random(roller)
            } else {
                0
            };
            total += damage;
            current_hp = current_hp.saturating_sub(damage);
        }
        Ok(total)
    }
}

/// Memoized recursion over `(current_hp, remaining)`. Reachable HP values are
/// bounded by the starting HP, so the number of states stays polynomial.
struct SalvoSolver<'a> {
    model: &'a SalvoDamageModel,
    per_hit: FxHashMap<u32, ProbabilityDistribution<u32>>,
    memo: FxHashMap<(u32, u32), ProbabilityDistribution<u32>>,
}

impl<'a> SalvoSolver<'a> {
    fn new(model: &'a SalvoDamageModel) -> Self {
        Self {
            model,
            per_hit: FxHashMap::default(),
            memo: FxHashMap::default(),
        }
    }

    fn memoized_states(&self) -> usize {
        self.memo.len()
    }

    fn per_hit(&mut self, current_hp: u32) -> Result<ProbabilityDistribution<u32>, ValidationError> {
        if let Some(dist) = self.per_hit.get(&current_hp) {
            return Ok(dist.clone());
        }
        let dist = self.model.per_hit_distribution(current_hp)?;
        self.per_hit.insert(current_hp, dist.clone());
        Ok(dist)
    }

    fn solve(
        &mut self,
        current_hp: u32,
        remaining: u32,
    ) -> Result<ProbabilityDistribution<u32>, ValidationError> {
        if let Some(cached) = self.memo.get(&(current_hp, remaining)) {
            log::trace!("Salvo state (hp={}, remaining={}) cached", current_hp, remaining);
            return Ok(cached.clone());
        }

        let per_hit = self.per_hit(current_hp)?;
        let result = if remaining <= 1 {
            per_hit
        } else {
            let mut builder = DistributionBuilder::new();
            for (&first, first_rate) in per_hit.iter() {
                let next_hp = current_hp.saturating_sub(first);
                let rest = self.solve(next_hp, remaining - 1)?;
                // at most (current_hp - 1) + one hit, which `new` keeps within u32
                for (&second, second_rate) in rest.iter() {
                    builder.add(first + second, first_rate * second_rate);
                }
            }
            builder.build()
        };

        log::trace!(
            "Salvo state (hp={}, remaining={}) resolved to {} outcomes",
            current_hp,
            remaining,
            result.len()
        );
        self.memo.insert((current_hp, remaining), result.clone());
        Ok(result)
    }
}
