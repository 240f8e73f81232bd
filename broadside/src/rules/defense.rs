use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    statistics::{distribution::ProbabilityDistribution, roller::Roller},
};

/// Lowest defense roll as a fraction of the (effective) defense base.
pub const DEFENSE_ROLL_FLOOR: f64 = 0.7;
/// Width of one defense roll step.
pub const DEFENSE_ROLL_STEP: f64 = 0.6;

fn default_sinkable() -> bool {
    true
}

/// Target state for one damage evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenseParams {
    pub armor: u32,
    #[serde(default)]
    pub improvement_bonus: f64,
    pub current_hp: u32,
    /// Lethal blows are replaced by protection damage while not sinkable.
    #[serde(default)]
    pub protection: bool,
    #[serde(default = "default_sinkable")]
    pub sinkable: bool,
}

impl DefenseParams {
    pub fn new(armor: u32, current_hp: u32) -> Self {
        Self {
            armor,
            improvement_bonus: 0.0,
            current_hp,
            protection: false,
            sinkable: true,
        }
    }

    pub fn improvement_bonus(mut self, improvement_bonus: f64) -> Self {
        self.improvement_bonus = improvement_bonus;
        self
    }

    pub fn protection(mut self, protection: bool) -> Self {
        self.protection = protection;
        self
    }

    pub fn sinkable(mut self, sinkable: bool) -> Self {
        self.sinkable = sinkable;
        self
    }

    /// The same target after its HP has changed.
    pub fn with_current_hp(mut self, current_hp: u32) -> Self {
        self.current_hp = current_hp;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.current_hp == 0 {
            return Err(ValidationError::ZeroHp);
        }
        if !self.improvement_bonus.is_finite() || self.improvement_bonus < 0.0 {
            return Err(ValidationError::InvalidImprovementBonus(
                self.improvement_bonus,
            ));
        }
        Ok(())
    }
}

/// One of the equally likely defense roll outcomes, identified by its step
/// index above the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct DefenseRoll(pub u32);

/// The discrete uniform defense roll of a target: `count` values starting at
/// 70% of the defense base and spaced [`DEFENSE_ROLL_STEP`] apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefensePowerModel {
    base: f64,
    min: f64,
    count: u32,
}

impl DefensePowerModel {
    /// A base below one would leave no rolls at all. Such targets get a single
    /// roll at the minimum instead.
    pub fn new(armor: u32, improvement_bonus: f64) -> Result<Self, ValidationError> {
        if !improvement_bonus.is_finite() || improvement_bonus < 0.0 {
            return Err(ValidationError::InvalidImprovementBonus(improvement_bonus));
        }
        let base = armor as f64 + improvement_bonus;
        let min = base.max(1.0) * DEFENSE_ROLL_FLOOR;
        let raw_count = base.floor();
        let count = if raw_count < 1.0 {
            log::warn!(
                "Defense base {} yields no rolls; falling back to a single roll of {}",
                base,
                min
            );
            1
        } else {
            raw_count as u32
        };
        Ok(Self { base, min, count })
    }

    pub fn from_params(params: &DefenseParams) -> Result<Self, ValidationError> {
        Self::new(params.armor, params.improvement_bonus)
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.value(DefenseRoll::from(self.count - 1))
    }

    pub fn value(&self, roll: DefenseRoll) -> f64 {
        self.min + u32::from(roll) as f64 * DEFENSE_ROLL_STEP
    }

    pub fn rolls(&self) -> impl Iterator<Item = DefenseRoll> + use<> {
        (0..self.count).map(DefenseRoll::from)
    }

    pub fn values(&self) -> Vec<f64> {
        self.rolls().map(|roll| self.value(roll)).collect()
    }

    /// Probability of each individual roll.
    pub fn probability(&self) -> f64 {
        1.0 / self.count as f64
    }

    pub fn to_distribution(&self) -> ProbabilityDistribution<DefenseRoll> {
        ProbabilityDistribution::relative_frequency(self.rolls())
    }

    pub fn random_roll(&self, roller: &mut Roller) -> DefenseRoll {
        roller.roll(0, self.count - 1).into()
    }

    pub fn random_draw(&self, roller: &mut Roller) -> f64 {
        self.value(self.random_roll(roller))
    }
}

#[cfg(test)]
mod tests {
    use statrs::assert_almost_eq;

    use super::*;

    #[test]
    fn test_ten_armor() {
        let model = DefensePowerModel::new(10, 0.0).unwrap();
        assert_eq!(model.count(), 10);
        assert_almost_eq!(model.min(), 7.0, 1e-9);
        assert_almost_eq!(model.max(), 12.4, 1e-9);

        let values = model.values();
        assert_eq!(values.len(), 10);
        for (i, value) in values.iter().enumerate() {
            assert_almost_eq!(*value, 7.0 + 0.6 * i as f64, 1e-9);
        }

        let dist = model.to_distribution();
        assert_eq!(dist.len(), 10);
        for roll in model.rolls() {
            assert_almost_eq!(dist.get(&roll), 0.1, 1e-12);
        }
        assert_almost_eq!(dist.sum(), 1.0, 1e-12);
    }

    #[test]
    fn test_improvement_bonus() {
        let model = DefensePowerModel::new(10, 2.5).unwrap();
        // floor(12.5) rolls starting at 12.5 * 0.7
        assert_eq!(model.count(), 12);
        assert_almost_eq!(model.min(), 8.75, 1e-9);
        assert_almost_eq!(model.max(), 8.75 + 11.0 * 0.6, 1e-9);
    }

    #[test]
    fn test_degenerate_base_falls_back_to_single_roll() {
        for bonus in [0.0, 0.5] {
            let model = DefensePowerModel::new(0, bonus).unwrap();
            assert_eq!(model.count(), 1);
            assert_almost_eq!(model.min(), 0.7, 1e-12);
            assert_almost_eq!(model.max(), 0.7, 1e-12);
            assert_almost_eq!(model.probability(), 1.0, 1e-12);
            assert_eq!(model.to_distribution().get(&DefenseRoll::from(0)), 1.0);
        }
    }

    #[test]
    fn test_invalid_bonus() {
        assert_eq!(
            DefensePowerModel::new(10, -1.0),
            Err(ValidationError::InvalidImprovementBonus(-1.0))
        );
        assert!(DefensePowerModel::new(10, f64::NAN).is_err());
    }

    #[test]
    fn test_random_draw_within_bounds() {
        let model = DefensePowerModel::new(37, 1.2).unwrap();
        let mut roller = Roller::test_rng();
        for _ in 0..10000 {
            let draw = model.random_draw(&mut roller);
            assert!(draw >= model.min() - 1e-9 && draw <= model.max() + 1e-9);
        }
    }

    #[test]
    fn test_validate_params() {
        assert!(DefenseParams::new(10, 30).validate().is_ok());
        assert_eq!(
            DefenseParams::new(10, 0).validate(),
            Err(ValidationError::ZeroHp)
        );
        assert!(
            DefenseParams::new(10, 30)
                .improvement_bonus(-0.5)
                .validate()
                .is_err()
        );
    }
}
