//! Incremental sufficient-statistics accumulators shared by the split engine
//! and the leaves that freeze their final state.
//!
//! [`StatAccumulator`] and [`EntropyAccumulator`] are unified behind a single
//! tagged-variant [`Accumulator`] so the split engine, the tree, and the
//! ensemble never need to be generic over "which kind of impurity" — they
//! just carry an [`AccumulatorKind`] around and ask it to mint blank
//! accumulators.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Running sum/sum-of-squares accumulator for regression targets.
///
/// `Metric` is the population variance and `Estimate` the weighted mean. The
/// two-pass form via `sum_of_squares` is used despite its known conditioning
/// weakness; shift your data or swap in a Welford accumulator if precision
/// matters for your inputs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatAccumulator {
    count: usize,
    weighted_count: f64,
    sum: f64,
    sum_of_squares: f64,
}

impl StatAccumulator {
    pub fn add(&mut self, x: f64, weight: f64) {
        self.count += 1;
        self.weighted_count += weight;
        self.sum += weight * x;
        self.sum_of_squares += weight * x * x;
    }

    pub fn remove(&mut self, x: f64, weight: f64) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvariantViolation(
                "more calls to remove() than add() on StatAccumulator".into(),
            ));
        }
        self.count -= 1;
        self.weighted_count -= weight;
        self.sum -= weight * x;
        self.sum_of_squares -= weight * x * x;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn weighted_count(&self) -> f64 {
        self.weighted_count
    }

    pub fn metric(&self) -> Result<f64> {
        if self.count == 0 || self.weighted_count == 0.0 {
            return Ok(0.0);
        }
        let variance = self.sum_of_squares / self.weighted_count
            - (self.sum / self.weighted_count).powi(2);
        if variance < 0.0 {
            return Err(Error::InvariantViolation(format!(
                "negative variance ({variance}); this indicates catastrophic cancellation"
            )));
        }
        Ok(variance)
    }

    pub fn estimate(&self) -> f64 {
        if self.count == 0 || self.weighted_count == 0.0 {
            return 0.0;
        }
        self.sum / self.weighted_count
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Per-category weighted-count accumulator for classification targets.
///
/// `Metric` is Shannon entropy in bits and `Estimate` is the argmax category
/// (ties broken toward the lowest index, i.e. first-seen).
#[derive(Clone, Debug, PartialEq)]
pub struct EntropyAccumulator {
    counts: Vec<f64>,
    total_count: usize,
    total_weight: f64,
}

impl EntropyAccumulator {
    pub fn new(categories: usize) -> Self {
        Self {
            counts: vec![0.0; categories],
            total_count: 0,
            total_weight: 0.0,
        }
    }

    fn category_index(&self, category: f64) -> Result<usize> {
        let idx = category.round();
        if idx < 0.0 || idx as usize >= self.counts.len() {
            return Err(Error::InvariantViolation(format!(
                "category {category} out of range [0, {})",
                self.counts.len()
            )));
        }
        Ok(idx as usize)
    }

    pub fn add(&mut self, category: f64, weight: f64) -> Result<()> {
        let idx = self.category_index(category)?;
        self.counts[idx] += weight;
        self.total_count += 1;
        self.total_weight += weight;
        Ok(())
    }

    pub fn remove(&mut self, category: f64, weight: f64) -> Result<()> {
        let idx = self.category_index(category)?;
        if self.total_count == 0 || self.counts[idx] <= 0.0 {
            return Err(Error::InvariantViolation(format!(
                "more calls to remove() than add() for category {idx}"
            )));
        }
        self.counts[idx] -= weight;
        self.total_count -= 1;
        self.total_weight -= weight;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.total_count
    }

    pub fn weighted_count(&self) -> f64 {
        self.total_weight
    }

    pub fn metric(&self) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let mut entropy = 0.0;
        for &count in &self.counts {
            if count > 0.0 {
                let p = count / self.total_weight;
                entropy -= p * p.log2();
            }
        }
        entropy
    }

    pub fn estimate(&self) -> f64 {
        let mut best_idx = 0usize;
        let mut best_count = 0.0f64;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > best_count {
                best_count = count;
                best_idx = i;
            }
        }
        best_idx as f64
    }

    pub fn clear(&mut self) {
        for c in &mut self.counts {
            *c = 0.0;
        }
        self.total_count = 0;
        self.total_weight = 0.0;
    }
}

/// Union of [`StatAccumulator`] and [`EntropyAccumulator`], per the
/// single-tagged-variant accumulator design: both the split engine and the
/// tree's leaves carry one of these without needing to be generic over the
/// impurity kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Accumulator {
    Stat(StatAccumulator),
    Entropy(EntropyAccumulator),
}

impl Accumulator {
    pub fn add(&mut self, value: f64, weight: f64) -> Result<()> {
        match self {
            Accumulator::Stat(s) => {
                s.add(value, weight);
                Ok(())
            }
            Accumulator::Entropy(e) => e.add(value, weight),
        }
    }

    pub fn remove(&mut self, value: f64, weight: f64) -> Result<()> {
        match self {
            Accumulator::Stat(s) => s.remove(value, weight),
            Accumulator::Entropy(e) => e.remove(value, weight),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Accumulator::Stat(s) => s.count(),
            Accumulator::Entropy(e) => e.count(),
        }
    }

    pub fn weighted_count(&self) -> f64 {
        match self {
            Accumulator::Stat(s) => s.weighted_count(),
            Accumulator::Entropy(e) => e.weighted_count(),
        }
    }

    pub fn metric(&self) -> Result<f64> {
        match self {
            Accumulator::Stat(s) => s.metric(),
            Accumulator::Entropy(e) => Ok(e.metric()),
        }
    }

    pub fn estimate(&self) -> f64 {
        match self {
            Accumulator::Stat(s) => s.estimate(),
            Accumulator::Entropy(e) => e.estimate(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            Accumulator::Stat(s) => s.clear(),
            Accumulator::Entropy(e) => e.clear(),
        }
    }
}

/// Which concrete accumulator a tree should grow with: variance for
/// regression, entropy over `categories` classes for classification.
/// `outputCategories`: 0 is unused, 1 is regression, k>1 is k-class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorKind {
    Regression,
    Classification { categories: usize },
}

impl AccumulatorKind {
    pub fn blank(&self) -> Accumulator {
        match self {
            AccumulatorKind::Regression => Accumulator::Stat(StatAccumulator::default()),
            AccumulatorKind::Classification { categories } => {
                Accumulator::Entropy(EntropyAccumulator::new(*categories))
            }
        }
    }
}

/// One-sided running mean, used both for a sample's out-of-bag accumulator
/// (accumulating tree predictions) and a tree's/ensemble's scratch error
/// accumulator (accumulating `output - estimate` residuals). `Estimate` is
/// the weighted mean of whatever was added.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeanErrorAccumulator {
    count: usize,
    weighted_count: f64,
    sum: f64,
}

impl MeanErrorAccumulator {
    pub fn add(&mut self, value: f64, weight: f64) {
        self.count += 1;
        self.weighted_count += weight;
        self.sum += weight * value;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn estimate(&self) -> f64 {
        if self.count == 0 || self.weighted_count == 0.0 {
            return 0.0;
        }
        self.sum / self.weighted_count
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A [`MeanErrorAccumulator`] built from atomics instead of a plain struct, so
/// a [`super::sample::Sample`] holding one stays `Sync` and can be shared as
/// `&Sample` across the `parallel` feature's rayon threads. Every actual
/// mutation still happens from a single thread at a time — trees touch their
/// own OOB slice during growth, and cross-tree merges happen sequentially
/// after the parallel region — so `Relaxed` ordering and a compare-exchange
/// retry loop for the float fields are sufficient.
#[derive(Debug, Default)]
pub struct AtomicMeanAccumulator {
    count: AtomicUsize,
    weighted_count: AtomicU64,
    sum: AtomicU64,
}

impl AtomicMeanAccumulator {
    pub fn add(&self, value: f64, weight: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        Self::fetch_add_f64(&self.weighted_count, weight);
        Self::fetch_add_f64(&self.sum, weight * value);
    }

    fn fetch_add_f64(slot: &AtomicU64, delta: f64) {
        let mut current = slot.load(Ordering::Relaxed);
        loop {
            let updated = f64::from_bits(current) + delta;
            match slot.compare_exchange_weak(
                current,
                updated.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn estimate(&self) -> f64 {
        let weighted_count = f64::from_bits(self.weighted_count.load(Ordering::Relaxed));
        if self.count() == 0 || weighted_count == 0.0 {
            return 0.0;
        }
        f64::from_bits(self.sum.load(Ordering::Relaxed)) / weighted_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn atomic_mean_accumulator_tracks_count_and_mean() {
        let acc = AtomicMeanAccumulator::default();
        acc.add(4.0, 1.0);
        acc.add(6.0, 1.0);
        assert_eq!(acc.count(), 2);
        assert!((acc.estimate() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn stat_accumulator_s1() {
        // S1: (3,7),(1,4),(2,4) — after adding all three, variance over {7,4,4}
        let mut acc = StatAccumulator::default();
        acc.add(7.0, 1.0);
        acc.add(4.0, 1.0);
        acc.add(4.0, 1.0);
        let mean = 5.0;
        let expected = ((7.0 - mean).powi(2) + (4.0 - mean).powi(2) + (4.0 - mean).powi(2)) / 3.0;
        assert!((acc.metric().unwrap() - expected).abs() < 1e-12);
        assert!((acc.estimate() - mean).abs() < 1e-12);
    }

    #[test]
    fn entropy_accumulator_s4() {
        // S4: labels {3,1,2,3} over 5 classes, full set entropy
        let mut acc = EntropyAccumulator::new(5);
        for &c in &[3.0, 1.0, 2.0, 3.0] {
            acc.add(c, 1.0).unwrap();
        }
        // two of four are class 3, one each of 1 and 2
        let p3 = 0.5_f64;
        let p1 = 0.25_f64;
        let p2 = 0.25_f64;
        let expected = -(p3 * p3.log2() + p1 * p1.log2() + p2 * p2.log2());
        assert!((acc.metric() - expected).abs() < 1e-12);
    }

    #[test]
    fn entropy_category_out_of_range_is_invariant_violation() {
        let mut acc = EntropyAccumulator::new(3);
        assert!(acc.add(3.0, 1.0).is_err());
        assert!(acc.add(-1.0, 1.0).is_err());
    }

    #[test]
    fn remove_without_add_is_invariant_violation() {
        let mut acc = StatAccumulator::default();
        assert!(acc.remove(1.0, 1.0).is_err());

        let mut eacc = EntropyAccumulator::new(2);
        assert!(eacc.remove(0.0, 1.0).is_err());
    }

    proptest! {
        // P1: Add/Remove symmetry under any permutation leaves Count=0, Metric=0.
        #[test]
        fn stat_add_remove_symmetry(values in prop::collection::vec((-1e3f64..1e3, 0.1f64..10.0), 0..20)) {
            let mut acc = StatAccumulator::default();
            for &(x, w) in &values {
                acc.add(x, w);
            }
            for &(x, w) in values.iter().rev() {
                acc.remove(x, w).unwrap();
            }
            prop_assert_eq!(acc.count(), 0);
            prop_assert!(acc.metric().unwrap().abs() < 1e-6);
        }

        #[test]
        fn entropy_add_remove_symmetry(cats in prop::collection::vec(0usize..5, 0..20)) {
            let mut acc = EntropyAccumulator::new(5);
            for &c in &cats {
                acc.add(c as f64, 1.0).unwrap();
            }
            for &c in cats.iter().rev() {
                acc.remove(c as f64, 1.0).unwrap();
            }
            prop_assert_eq!(acc.count(), 0);
            prop_assert!(acc.metric().abs() < 1e-12);
        }
    }
}
