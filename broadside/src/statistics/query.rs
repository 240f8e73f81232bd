use crate::statistics::distribution::ProbabilityDistribution;

/// A question asked of a damage distribution.
pub trait Query {
    type Output;
    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output>;
}

impl<F, O> Query for F
where
    F: Fn(&ProbabilityDistribution<u32>) -> anyhow::Result<O>,
{
    type Output = O;

    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output> {
        (self)(distribution)
    }
}

/// Mean damage.
pub struct ExpectedDamage;

impl Query for ExpectedDamage {
    type Output = f64;

    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output> {
        match distribution.expected_value() {
            Some(value) => Ok(value),
            None => anyhow::bail!("Cannot take the mean of an empty distribution"),
        }
    }
}

/// The smallest damage `d` such that `P(X <= d) >= p`.
pub struct Percentile(pub f64);

impl Query for Percentile {
    type Output = u32;

    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output> {
        let p = self.0;
        if !(0.0..=1.0).contains(&p) {
            anyhow::bail!("Percentile must lie within [0, 1], got {}", p);
        }
        let cumulative = distribution.cumulative();
        // cdf rounding can leave the last entry a hair under 1
        let found = cumulative
            .iter()
            .find(|(_, cdf)| *cdf >= p - 1e-12)
            .or(cumulative.last());
        match found {
            Some((damage, _)) => Ok(*damage),
            None => anyhow::bail!("Cannot take a percentile of an empty distribution"),
        }
    }
}

/// Probability that the damage dealt is at least the given threshold.
pub struct DamageAtLeast(pub u32);

impl Query for DamageAtLeast {
    type Output = f64;

    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output> {
        let total = distribution.sum();
        if total > 0.0 {
            Ok(distribution.weight_at_least(self.0) / total)
        } else {
            Ok(0.0)
        }
    }
}

/// Probability that the damage dealt reaches the target's current HP.
pub struct SinkProbability {
    pub current_hp: u32,
}

impl SinkProbability {
    pub fn new(current_hp: u32) -> Self {
        Self { current_hp }
    }
}

impl Query for SinkProbability {
    type Output = f64;

    fn query(&self, distribution: &ProbabilityDistribution<u32>) -> anyhow::Result<Self::Output> {
        DamageAtLeast(self.current_hp).query(distribution)
    }
}
