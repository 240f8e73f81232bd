use thiserror::Error;

/// Rejected inputs. Every model constructor validates eagerly so that no
/// computation ever runs on a malformed target or attack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("current HP must be positive")]
    ZeroHp,
    #[error("attack count must be positive")]
    ZeroCount,
    #[error("improvement bonus must be finite and non-negative, got {0}")]
    InvalidImprovementBonus(f64),
    #[error("attack term must be finite, got {0}")]
    NonFiniteAttackTerm(f64),
    #[error("attack term {0} exceeds the largest representable damage")]
    AttackTermTooLarge(f64),
    #[error("{current_hp} HP plus an attack term of {attack_term} exceeds the largest representable salvo damage")]
    SalvoDamageOverflow { current_hp: u32, attack_term: f64 },
    #[error("remaining ammo modifier must lie within (0, 1], got {0}")]
    InvalidAmmoModifier(f64),
    #[error("armor penetration must be finite and non-negative, got {0}")]
    InvalidArmorPenetration(f64),
    #[error("{name} hit rate must lie within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("normal rate {normal} and critical rate {critical} sum to more than 1")]
    RateSumExceedsOne { normal: f64, critical: f64 },
}
