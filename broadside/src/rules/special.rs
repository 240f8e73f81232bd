use crate::{
    error::ValidationError,
    statistics::{distribution::ProbabilityDistribution, roller::Roller},
};

/// Damage that replaces the computed value and scales with the target's
/// current HP: `floor(hp * HP_FACTOR + r * RANDOM_FACTOR)` for a uniform
/// `r` in `0..hp`.
pub trait HpScaledDamage {
    const HP_FACTOR: f64;
    const RANDOM_FACTOR: f64;

    fn current_hp(&self) -> u32;

    fn calc(&self, random_value: u32) -> u32 {
        let hp = self.current_hp() as f64;
        (hp * Self::HP_FACTOR + random_value as f64 * Self::RANDOM_FACTOR).floor() as u32
    }

    fn min(&self) -> u32 {
        self.calc(0)
    }

    fn max(&self) -> u32 {
        self.calc(self.current_hp() - 1)
    }

    fn random(&self, roller: &mut Roller) -> u32 {
        self.calc(roller.roll(0, self.current_hp() - 1))
    }

    fn values(&self) -> Vec<u32> {
        (0..self.current_hp()).map(|r| self.calc(r)).collect()
    }

    fn to_distribution(&self) -> ProbabilityDistribution<u32> {
        ProbabilityDistribution::relative_frequency(self.values())
    }
}

/// Chip damage dealt when the computed damage would be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchDamageModel {
    current_hp: u32,
}

impl ScratchDamageModel {
    pub fn new(current_hp: u32) -> Result<Self, ValidationError> {
        if current_hp == 0 {
            return Err(ValidationError::ZeroHp);
        }
        Ok(Self { current_hp })
    }
}

impl HpScaledDamage for ScratchDamageModel {
    const HP_FACTOR: f64 = 0.06;
    const RANDOM_FACTOR: f64 = 0.08;

    fn current_hp(&self) -> u32 {
        self.current_hp
    }
}

/// Capped damage dealt instead of a lethal blow on a protected target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionDamageModel {
    current_hp: u32,
}

impl ProtectionDamageModel {
    pub fn new(current_hp: u32) -> Result<Self, ValidationError> {
        if current_hp == 0 {
            return Err(ValidationError::ZeroHp);
        }
        Ok(Self { current_hp })
    }
}

impl HpScaledDamage for ProtectionDamageModel {
    const HP_FACTOR: f64 = 0.5;
    const RANDOM_FACTOR: f64 = 0.3;

    fn current_hp(&self) -> u32 {
        self.current_hp
    }
}

#[cfg(test)]
mod tests {
    use statrs::assert_almost_eq;

    use super::*;

    #[test]
    fn test_scratch_bounds() {
        let model = ScratchDamageModel::new(100).unwrap();
        assert_eq!(model.min(), 6);
        assert_eq!(model.max(), 13);
        assert_eq!(model.values().len(), 100);

        let dist = model.to_distribution();
        assert_almost_eq!(dist.sum(), 1.0, 1e-12);
        assert_eq!(dist.min_key(), Some(6));
        assert_eq!(dist.max_key(), Some(13));
    }

    #[test]
    fn test_protection_bounds() {
        let model = ProtectionDamageModel::new(100).unwrap();
        assert_eq!(model.min(), 50);
        assert_eq!(model.max(), 79);

        let dist = model.to_distribution();
        assert_almost_eq!(dist.sum(), 1.0, 1e-12);
        assert!(dist.keys().all(|&k| (50..=79).contains(&k)));
    }

    #[test]
    fn test_protection_never_lethal() {
        for hp in 1..200 {
            let model = ProtectionDamageModel::new(hp).unwrap();
            assert!(model.max() < hp);
        }
    }

    #[test]
    fn test_single_hp() {
        let scratch = ScratchDamageModel::new(1).unwrap();
        assert_eq!(scratch.values(), vec![0]);
        assert_eq!(scratch.to_distribution().get(&0), 1.0);
    }

    #[test]
    fn test_random_within_bounds() {
        let scratch = ScratchDamageModel::new(57).unwrap();
        let protection = ProtectionDamageModel::new(57).unwrap();
        let mut roller = Roller::test_rng();
        for _ in 0..10000 {
            let s = scratch.random(&mut roller);
            assert!(s >= scratch.min() && s <= scratch.max());
            let p = protection.random(&mut roller);
            assert!(p >= protection.min() && p <= protection.max());
        }
    }

    #[test]
    fn test_zero_hp_rejected() {
        assert_eq!(ScratchDamageModel::new(0), Err(ValidationError::ZeroHp));
        assert_eq!(ProtectionDamageModel::new(0), Err(ValidationError::ZeroHp));
    }
}
