//! The ensemble trainer: bootstrap bagging, out-of-bag (OOB) error
//! accumulation, and (optionally) rayon-parallel tree growth.

use log::{debug, warn};
use rand::Rng;
#[cfg(feature = "parallel")]
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::utils::shuffle;

use super::accumulator::{AccumulatorKind, MeanErrorAccumulator};
use super::decision_tree::{DecisionTree, TreeConfig};
use super::sample::{FeatureOracle, Sample};

/// A randomized-tree ensemble: an append-only forest of [`DecisionTree`]s
/// plus the scratch accumulator [`Self::error`] reuses on every call.
#[derive(Default)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    error: MeanErrorAccumulator,
}

impl RandomForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn bag_size(total: usize) -> usize {
        2 * total / 3
    }

    /// Grow `n` trees sequentially. Each tree draws a fresh shuffle of
    /// `data`, takes the leading two-thirds as its bag, grows on it, then
    /// classifies the remaining third and accumulates each prediction into
    /// that sample's OOB accumulator.
    pub fn add_trees<O: FeatureOracle, R: Rng>(
        &mut self,
        n: usize,
        data: &[Sample<O>],
        config: TreeConfig,
        kind: AccumulatorKind,
        rng: &mut R,
    ) -> Result<()> {
        for _ in 0..n {
            let mut order: Vec<&Sample<O>> = data.iter().collect();
            shuffle(&mut order, rng);
            let (bag, oob) = order.split_at(Self::bag_size(order.len()));

            if oob.is_empty() {
                warn!("bag of {} samples left no OOB holdout for this tree", bag.len());
            }
            let mut tree = DecisionTree::grow(bag, config, kind, rng)?;
            for d in oob {
                let p = tree.classify(d).estimate();
                d.oob_add(p);
                tree.record_error(d.output() - p, d.weight());
            }
            debug!(
                "grew tree {} on {} bag / {} oob samples (size={}, depth={})",
                self.trees.len(),
                bag.len(),
                oob.len(),
                tree.size(),
                tree.depth()
            );
            self.trees.push(tree);
        }
        Ok(())
    }

    /// Parallel variant of [`Self::add_trees`]. Each of the `n` trees draws
    /// its own seed from `rng` up front (so the outcome is reproducible for
    /// a fixed seed regardless of the thread count), then grows from an
    /// independent `ChaCha8Rng`. OOB predictions are collected into a
    /// per-tree local side table during the parallel region; the side
    /// tables are merged into the shared samples sequentially afterward, so
    /// no sample is ever written from more than one thread at a time.
    #[cfg(feature = "parallel")]
    pub fn par_add_trees<O, R>(
        &mut self,
        n: usize,
        data: &[Sample<O>],
        config: TreeConfig,
        kind: AccumulatorKind,
        rng: &mut R,
    ) -> Result<()>
    where
        O: FeatureOracle + Sync,
        R: Rng,
    {
        let seeds: Vec<u64> = (0..n).map(|_| rng.gen::<u64>()).collect();

        let grown: Vec<Result<(DecisionTree, Vec<(usize, f64)>)>> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut local_rng = ChaCha8Rng::seed_from_u64(seed);
                let mut order: Vec<usize> = (0..data.len()).collect();
                shuffle(&mut order, &mut local_rng);
                let (bag_idx, oob_idx) = order.split_at(Self::bag_size(order.len()));
                let bag: Vec<&Sample<O>> = bag_idx.iter().map(|&i| &data[i]).collect();

                let mut tree = DecisionTree::grow(&bag, config, kind, &mut local_rng)?;
                let mut local_oob = Vec::with_capacity(oob_idx.len());
                for &i in oob_idx {
                    let p = tree.classify(&data[i]).estimate();
                    tree.record_error(data[i].output() - p, data[i].weight());
                    local_oob.push((i, p));
                }
                Ok((tree, local_oob))
            })
            .collect();

        for result in grown {
            let (tree, local_oob) = result?;
            for (i, p) in local_oob {
                data[i].oob_add(p);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    /// Mean OOB residual over every sample with at least one OOB
    /// observation. Samples never held out by any tree are excluded rather
    /// than assigned a manufactured estimate.
    pub fn error<O: FeatureOracle>(&mut self, data: &[Sample<O>]) -> f64 {
        self.error.clear();
        for d in data {
            if d.oob_count() > 0 {
                self.error.add(d.output() - d.oob_estimate(), d.weight());
            }
        }
        self.error.estimate()
    }
}
