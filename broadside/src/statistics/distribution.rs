use std::{fmt::Display, hash::Hash};

use rustc_hash::FxHashMap;

/// A finite weighted map over outcome keys.
///
/// Weights are non-negative but are not required to sum to one, so raw
/// occurrence counts are valid distributions too. Every operation on a
/// `ProbabilityDistribution` leaves the receiver untouched and returns a new
/// distribution. Many mutations can be folded into a single copy with
/// [`ProbabilityDistribution::batch`], which hands a [`DistributionBuilder`]
/// to a closure.
///
/// Key order is unspecified.
#[derive(Debug, Clone)]
pub struct ProbabilityDistribution<K> {
    weights: FxHashMap<K, f64>,
}

impl<K> Default for ProbabilityDistribution<K> {
    fn default() -> Self {
        Self {
            weights: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash> PartialEq for ProbabilityDistribution<K> {
    fn eq(&self, other: &Self) -> bool {
        self.weights == other.weights
    }
}

impl<K: Eq + Hash + Clone> ProbabilityDistribution<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A distribution holding a single key.
    pub fn point(key: K, weight: f64) -> Self {
        let mut weights = FxHashMap::default();
        weights.insert(key, weight);
        Self { weights }
    }

    /// Weight of each key is the number of times it occurs in `items`.
    pub fn count(items: impl IntoIterator<Item = K>) -> Self {
        let mut builder = DistributionBuilder::new();
        for item in items {
            builder.add(item, 1.0);
        }
        builder.build()
    }

    /// Like [`ProbabilityDistribution::count`], scaled by `1 / len(items)`.
    pub fn relative_frequency(items: impl IntoIterator<Item = K>) -> Self {
        let items: Vec<K> = items.into_iter().collect();
        if items.is_empty() {
            return Self::new();
        }
        let scale = 1.0 / items.len() as f64;
        Self::count(items).multiply(scale)
    }

    /// Applies many mutations against one copy of this distribution.
    pub fn batch<F>(&self, f: F) -> Self
    where
        F: FnOnce(&mut DistributionBuilder<K>),
    {
        let mut builder = DistributionBuilder::from(self.clone());
        f(&mut builder);
        builder.build()
    }

    pub fn get(&self, key: &K) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.weights.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.weights.iter().map(|(k, &w)| (k, w))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.weights.keys()
    }

    pub fn set(&self, key: K, weight: f64) -> Self {
        self.batch(|b| {
            b.set(key, weight);
        })
    }

    pub fn add(&self, key: K, delta: f64) -> Self {
        self.batch(|b| {
            b.add(key, delta);
        })
    }

    /// Key-wise sum over the union of both key sets.
    pub fn add_distribution(&self, other: &Self) -> Self {
        self.batch(|b| {
            b.add_distribution(other);
        })
    }

    pub fn multiply(&self, scalar: f64) -> Self {
        self.batch(|b| {
            b.multiply(scalar);
        })
    }

    /// Relabels every key; weights of keys that collide are summed.
    pub fn map<J, F>(&self, f: F) -> ProbabilityDistribution<J>
    where
        J: Eq + Hash + Clone,
        F: Fn(&K) -> J,
    {
        let mut builder = DistributionBuilder::new();
        for (key, &weight) in &self.weights {
            builder.add(f(key), weight);
        }
        builder.build()
    }

    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&K, f64) -> bool,
    {
        self.batch(|b| {
            b.retain(predicate);
        })
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Rescales the weights to sum to one. A zero-weight distribution is
    /// returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total > 0.0 {
            self.multiply(1.0 / total)
        } else {
            self.clone()
        }
    }

    /// The entry with the lowest score, or `None` when empty.
    pub fn min_by<S, F>(&self, score: F) -> Option<(&K, f64)>
    where
        S: PartialOrd,
        F: Fn(&K, f64) -> S,
    {
        self.iter().min_by(|(ka, wa), (kb, wb)| {
            score(*ka, *wa)
                .partial_cmp(&score(*kb, *wb))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// The entry with the highest score, or `None` when empty.
    pub fn max_by<S, F>(&self, score: F) -> Option<(&K, f64)>
    where
        S: PartialOrd,
        F: Fn(&K, f64) -> S,
    {
        self.iter().max_by(|(ka, wa), (kb, wb)| {
            score(*ka, *wa)
                .partial_cmp(&score(*kb, *wb))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Compares two distributions key by key within `epsilon`. Keys missing
    /// from one side count as weight zero.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.weights
            .keys()
            .chain(other.weights.keys())
            .all(|k| (self.get(k) - other.get(k)).abs() <= epsilon)
    }
}

/// Numeric views used by the presentation and aggregation layers.
impl<K> ProbabilityDistribution<K>
where
    K: Eq + Hash + Copy + Ord + Into<f64>,
{
    /// Smallest key carrying non-zero weight.
    pub fn min_key(&self) -> Option<K> {
        self.iter().filter(|(_, w)| *w > 0.0).map(|(&k, _)| k).min()
    }

    /// Largest key carrying non-zero weight.
    pub fn max_key(&self) -> Option<K> {
        self.iter().filter(|(_, w)| *w > 0.0).map(|(&k, _)| k).max()
    }

    /// Weighted mean of the keys, relative to the total weight.
    pub fn expected_value(&self) -> Option<f64> {
        let total = self.sum();
        if total <= 0.0 {
            return None;
        }
        let weighted: f64 = self
            .iter()
            .map(|(&k, w)| {
                let value: f64 = k.into();
                value * w
            })
            .sum();
        Some(weighted / total)
    }

    /// Sorted `(key, P(X <= key))` pairs, relative to the total weight.
    pub fn cumulative(&self) -> Vec<(K, f64)> {
        let total = self.sum();
        let mut entries: Vec<(K, f64)> = self.iter().map(|(&k, w)| (k, w)).collect();
        entries.sort_by_key(|(k, _)| *k);
        let mut running = 0.0;
        entries
            .into_iter()
            .map(|(k, w)| {
                running += w;
                (k, if total > 0.0 { running / total } else { 0.0 })
            })
            .collect()
    }

    /// Total weight of keys greater than or equal to `threshold`.
    pub fn weight_at_least(&self, threshold: K) -> f64 {
        self.iter()
            .filter(|(k, _)| **k >= threshold)
            .map(|(_, w)| w)
            .sum()
    }
}

impl<K> ProbabilityDistribution<K>
where
    K: Eq + Hash + Copy + Ord + Into<f64> + Display,
{
    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        let total = self.sum();
        writeln!(f, "{:>8}  {:>9}  {:>9}", "value", "p", "cdf")?;
        let mut running = 0.0;
        let mut entries: Vec<(K, f64)> = self.iter().map(|(&k, w)| (k, w)).collect();
        entries.sort_by_key(|(k, _)| *k);
        for (key, weight) in entries {
            running += weight;
            let (p, cdf) = if total > 0.0 {
                (weight / total, running / total)
            } else {
                (0.0, 0.0)
            };
            writeln!(f, "{:>8}  {:>8.4}%  {:>8.4}%", key, p * 100.0, cdf * 100.0)?;
        }
        Ok(())
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, f64)> for ProbabilityDistribution<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut builder = DistributionBuilder::new();
        for (key, weight) in iter {
            builder.add(key, weight);
        }
        builder.build()
    }
}

impl<K> IntoIterator for ProbabilityDistribution<K> {
    type Item = (K, f64);
    type IntoIter = std::collections::hash_map::IntoIter<K, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.weights.into_iter()
    }
}

/// The mutable side of a [`ProbabilityDistribution`].
///
/// A builder owns its store outright, so nothing outside the builder can see
/// a half-applied batch. [`DistributionBuilder::batch`] nests freely.
#[derive(Debug, Clone)]
pub struct DistributionBuilder<K> {
    weights: FxHashMap<K, f64>,
}

impl<K> Default for DistributionBuilder<K> {
    fn default() -> Self {
        Self {
            weights: FxHashMap::default(),
        }
    }
}

impl<K> From<ProbabilityDistribution<K>> for DistributionBuilder<K> {
    fn from(distribution: ProbabilityDistribution<K>) -> Self {
        Self {
            weights: distribution.weights,
        }
    }
}

impl<K: Eq + Hash + Clone> DistributionBuilder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn set(&mut self, key: K, weight: f64) -> &mut Self {
        self.weights.insert(key, weight);
        self
    }

    pub fn add(&mut self, key: K, delta: f64) -> &mut Self {
        *self.weights.entry(key).or_insert(0.0) += delta;
        self
    }

    pub fn add_distribution(&mut self, other: &ProbabilityDistribution<K>) -> &mut Self {
        for (key, &weight) in &other.weights {
            self.add(key.clone(), weight);
        }
        self
    }

    pub fn multiply(&mut self, scalar: f64) -> &mut Self {
        for weight in self.weights.values_mut() {
            *weight *= scalar;
        }
        self
    }

    /// Relabels keys in place; colliding keys are summed.
    pub fn map_keys<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&K) -> K,
    {
        let old = std::mem::take(&mut self.weights);
        for (key, weight) in old {
            self.add(f(&key), weight);
        }
        self
    }

    pub fn retain<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&K, f64) -> bool,
    {
        self.weights.retain(|k, w| predicate(k, *w));
        self
    }

    /// Runs `f` against this same store.
    pub fn batch<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        f(self);
        self
    }

    pub fn build(self) -> ProbabilityDistribution<K> {
        ProbabilityDistribution {
            weights: self.weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use statrs::assert_almost_eq;

    use super::*;

    #[test]
    fn test_count() {
        let dist = ProbabilityDistribution::count(vec![1u32, 2, 2, 3, 3, 3]);
        assert_eq!(dist.get(&1), 1.0);
        assert_eq!(dist.get(&2), 2.0);
        assert_eq!(dist.get(&3), 3.0);
        assert_eq!(dist.get(&4), 0.0);
        assert_eq!(dist.sum(), 6.0);
    }

    #[test]
    fn test_relative_frequency() {
        let dist = ProbabilityDistribution::relative_frequency(vec!["a", "b", "b", "c", "c", "c", "c"]);
        assert_almost_eq!(dist.sum(), 1.0, 1e-12);
        assert_almost_eq!(dist.get(&"c"), 4.0 / 7.0, 1e-12);
        assert!(ProbabilityDistribution::<u32>::relative_frequency(vec![]).is_empty());
    }

    #[test]
    fn test_value_semantics() {
        let base = ProbabilityDistribution::point(5u32, 0.5);
        let added = base.add(5, 0.25).add(7, 0.25);
        assert_eq!(base.get(&5), 0.5);
        assert!(!base.contains(&7));
        assert_eq!(added.get(&5), 0.75);
        assert_eq!(added.get(&7), 0.25);

        let scaled = added.multiply(2.0);
        assert_eq!(added.sum(), 1.0);
        assert_eq!(scaled.sum(), 2.0);

        let replaced = scaled.set(5, 0.0);
        assert_eq!(replaced.get(&5), 0.0);
        assert_eq!(scaled.get(&5), 1.5);
    }

    #[test]
    fn test_add_distribution_unions_keys() {
        let a: ProbabilityDistribution<u32> = [(1, 0.2), (2, 0.3)].into_iter().collect();
        let b: ProbabilityDistribution<u32> = [(2, 0.1), (3, 0.4)].into_iter().collect();
        let sum = a.add_distribution(&b);
        assert_eq!(sum.len(), 3);
        assert_almost_eq!(sum.get(&1), 0.2, 1e-12);
        assert_almost_eq!(sum.get(&2), 0.4, 1e-12);
        assert_almost_eq!(sum.get(&3), 0.4, 1e-12);
    }

    #[test]
    fn test_map_identity_and_collisions() {
        let dist = ProbabilityDistribution::relative_frequency(vec![1u32, 2, 3, 4, 4]);
        assert_eq!(dist.map(|k| *k), dist);

        let parity = dist.map(|k| k % 2);
        assert_almost_eq!(parity.get(&0), 0.6, 1e-12);
        assert_almost_eq!(parity.get(&1), 0.4, 1e-12);
    }

    #[test]
    fn test_filter() {
        let dist: ProbabilityDistribution<u32> =
            [(0, 0.0), (1, 0.5), (2, 0.5)].into_iter().collect();
        let positive = dist.filter(|_, w| w > 0.0);
        assert_eq!(positive.len(), 2);
        assert!(!positive.contains(&0));
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn test_min_max_by() {
        let dist: ProbabilityDistribution<u32> =
            [(10, 0.1), (20, 0.7), (30, 0.2)].into_iter().collect();
        assert_eq!(dist.min_by(|k, _| *k).map(|(k, _)| *k), Some(10));
        assert_eq!(dist.max_by(|k, _| *k).map(|(k, _)| *k), Some(30));
        assert_eq!(dist.max_by(|_, w| w).map(|(k, _)| *k), Some(20));

        let empty = ProbabilityDistribution::<u32>::new();
        assert!(empty.min_by(|k, _| *k).is_none());
        assert!(empty.max_by(|k, _| *k).is_none());
    }

    #[test]
    fn test_batch_nests_on_one_store() {
        let base = ProbabilityDistribution::point(1u32, 1.0);
        let result = base.batch(|b| {
            b.add(2, 1.0);
            b.batch(|inner| {
                inner.add(3, 2.0).multiply(0.5);
            });
            b.map_keys(|k| k * 10);
        });
        assert_eq!(base.len(), 1);
        assert_eq!(result.get(&10), 0.5);
        assert_eq!(result.get(&20), 0.5);
        assert_eq!(result.get(&30), 1.0);
    }

    #[test]
    fn test_numeric_views() {
        let dist: ProbabilityDistribution<u32> =
            [(0, 0.0), (2, 0.25), (4, 0.5), (8, 0.25)].into_iter().collect();
        assert_eq!(dist.min_key(), Some(2));
        assert_eq!(dist.max_key(), Some(8));
        assert_almost_eq!(dist.expected_value().unwrap(), 4.5, 1e-12);
        assert_almost_eq!(dist.weight_at_least(4), 0.75, 1e-12);

        let cdf = dist.cumulative();
        assert_eq!(cdf.first().map(|(k, _)| *k), Some(0));
        assert_almost_eq!(cdf.last().unwrap().1, 1.0, 1e-12);

        assert!(ProbabilityDistribution::<u32>::new().expected_value().is_none());
    }

    #[test]
    fn test_normalized() {
        let counts = ProbabilityDistribution::count(vec![1u32, 1, 2, 3]);
        let normalized = counts.normalized();
        assert_almost_eq!(normalized.sum(), 1.0, 1e-12);
        assert_almost_eq!(normalized.get(&1), 0.5, 1e-12);
    }

    #[test]
    fn test_pretty_print() {
        let dist: ProbabilityDistribution<u32> = [(3, 0.5), (1, 0.5)].into_iter().collect();
        let mut out = String::new();
        dist.pretty_print(&mut out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with('1'));
        assert!(lines[2].contains("100.0000%"));
    }
}
