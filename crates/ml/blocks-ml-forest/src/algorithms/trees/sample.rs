//! The data model: samples carry their own feature oracle so the tree never
//! needs to know whether it is splitting tabular columns or image moments.

use std::sync::Arc;

use super::accumulator::AtomicMeanAccumulator;

/// A pure mapping from a feature-selection seed to a scalar feature value.
///
/// Implementations must be deterministic: the same seed on the same sample
/// always returns the same value. Memoization of the last-used seed is
/// permitted and is how [`crate::image::ImageOracle`] stays O(1) for the
/// repeated lookups the split engine performs while sorting.
pub trait FeatureOracle {
    fn feature(&self, seed: i64) -> f64;
}

/// Opaque sample identifier. Arbitrary strings are accepted — a dataset row
/// may be keyed by a UUID or content hash as readily as by a row number — so
/// this stays a `String` rather than forcing every key through a numeric
/// parse.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleKey(pub String);

impl From<u64> for SampleKey {
    fn from(index: u64) -> Self {
        SampleKey(index.to_string())
    }
}

/// Selects one column of a feature vector via `seed mod n_features`. This is
/// the tabular analogue of the image oracle: a concrete value holding a
/// reference into shared storage rather than a boxed closure.
#[derive(Clone, Debug)]
pub struct TabularOracle {
    features: Arc<[f64]>,
}

impl TabularOracle {
    pub fn new(features: impl Into<Arc<[f64]>>) -> Self {
        Self {
            features: features.into(),
        }
    }
}

impl FeatureOracle for TabularOracle {
    fn feature(&self, seed: i64) -> f64 {
        if self.features.is_empty() {
            return 0.0;
        }
        let idx = seed.rem_euclid(self.features.len() as i64) as usize;
        self.features[idx]
    }
}

/// An immutable logical training record, parameterized over its feature
/// oracle `O` (tabular columns, image moments, or a test fixture's closure
/// adapter).
#[derive(Debug)]
pub struct Sample<O: FeatureOracle> {
    key: SampleKey,
    weight: f64,
    output: f64,
    output_categories: usize,
    oracle: O,
    oob: AtomicMeanAccumulator,
}

impl<O: FeatureOracle> Sample<O> {
    pub fn new(key: SampleKey, weight: f64, output: f64, output_categories: usize, oracle: O) -> Self {
        Self {
            key,
            weight,
            output,
            output_categories,
            oracle,
            oob: AtomicMeanAccumulator::default(),
        }
    }

    pub fn key(&self) -> &SampleKey {
        &self.key
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn output_categories(&self) -> usize {
        self.output_categories
    }

    pub fn feature(&self, seed: i64) -> f64 {
        self.oracle.feature(seed)
    }

    /// Record a tree's prediction for this sample while it was out-of-bag.
    pub fn oob_add(&self, prediction: f64) {
        self.oob.add(prediction, self.weight);
    }

    /// Number of trees for which this sample has been out-of-bag.
    pub fn oob_count(&self) -> usize {
        self.oob.count()
    }

    /// Mean of accumulated out-of-bag predictions.
    pub fn oob_estimate(&self) -> f64 {
        self.oob.estimate()
    }
}

impl<O: FeatureOracle> FeatureOracle for Sample<O> {
    fn feature(&self, seed: i64) -> f64 {
        self.oracle.feature(seed)
    }
}

/// Convenience for test fixtures: wraps any `Fn(i64) -> f64` as a
/// [`FeatureOracle`] without requiring a named type.
pub struct ClosureOracle<F: Fn(i64) -> f64>(pub F);

impl<F: Fn(i64) -> f64> FeatureOracle for ClosureOracle<F> {
    fn feature(&self, seed: i64) -> f64 {
        (self.0)(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabular_oracle_selects_column_by_seed_modulo() {
        let oracle = TabularOracle::new(vec![10.0, 20.0, 30.0]);
        assert_eq!(oracle.feature(0), 10.0);
        assert_eq!(oracle.feature(1), 20.0);
        assert_eq!(oracle.feature(3), 10.0); // wraps
        assert_eq!(oracle.feature(4), 20.0);
    }

    #[test]
    fn sample_key_accepts_arbitrary_non_numeric_strings() {
        let key = SampleKey("row-uuid-9f2c".to_string());
        let sample = Sample::new(key.clone(), 1.0, 1.0, 1, TabularOracle::new(vec![1.0]));
        assert_eq!(*sample.key(), key);
    }

    #[test]
    fn oob_accumulator_tracks_count_and_mean() {
        let sample = Sample::new(SampleKey::from(0), 1.0, 5.0, 1, TabularOracle::new(vec![1.0]));
        assert_eq!(sample.oob_count(), 0);
        sample.oob_add(4.0);
        sample.oob_add(6.0);
        assert_eq!(sample.oob_count(), 2);
        assert!((sample.oob_estimate() - 5.0).abs() < 1e-12);
    }
}
