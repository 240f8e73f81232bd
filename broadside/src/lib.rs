pub mod error;
pub mod rules;
pub mod scenario;
pub mod statistics;

pub mod prelude {
    pub use crate::{
        error::ValidationError,
        rules::{
            damage::{DamageModifiers, DamageParams, SingleAttackDamageModel},
            defense::{DefenseParams, DefensePowerModel, DefenseRoll},
            salvo::{AttackTerms, HitRate, SalvoDamageModel},
            special::{HpScaledDamage, ProtectionDamageModel, ScratchDamageModel},
        },
        scenario::Scenario,
        statistics::{
            distribution::{DistributionBuilder, ProbabilityDistribution},
            query::{DamageAtLeast, ExpectedDamage, Percentile, Query, SinkProbability},
            roller::Roller,
        },
    };
}
