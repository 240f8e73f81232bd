use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(Debug)]
pub struct Roller {
    rng: StdRng,
}

impl Roller {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let rng = StdRng::from_os_rng();
        Roller { rng }
    }

    /// Creates a new `Roller` seeded from this one.
    /// Useful for handing independent generators to worker threads.
    pub fn fork(&mut self) -> Self {
        let mut seed = [0u8; 32];
        self.rng.fill(&mut seed);
        let rng = StdRng::from_seed(seed);
        Roller { rng }
    }

    pub fn from_seed(seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        Roller { rng }
    }

    /// Uniform integer in `min..=max`.
    pub fn roll(&mut self, min: u32, max: u32) -> u32 {
        self.rng.random_range(min..=max)
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    #[cfg(test)]
    pub fn test_rng() -> Self {
        Self::from_seed(42)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_bounds() {
        let mut roller = Roller::test_rng();
        for _ in 0..10000 {
            let roll = roller.roll(3, 7);
            assert!((3..=7).contains(&roll));
            let unit = roller.unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn test_seeded_rollers_agree() {
        let mut a = Roller::from_seed(7);
        let mut b = Roller::from_seed(7);
        for _ in 0..100 {
            assert_eq!(a.roll(0, 1000), b.roll(0, 1000));
        }
        let mut forked = a.fork();
        let mut forked_again = b.fork();
        assert_eq!(forked.roll(0, u32::MAX), forked_again.roll(0, u32::MAX));
    }
}
