//! A single randomized decision tree: recursive binary partitioning with
//! random-feature candidate generation, depth/leaf-size stopping, and
//! deterministic re-splitting via stored seeds.

use log::{debug, trace};
use rand::Rng;

use crate::error::Result;

use super::accumulator::{Accumulator, AccumulatorKind, MeanErrorAccumulator};
use super::sample::{FeatureOracle, Sample};
use super::split::continuous_feature_split;

/// Upper bound used when drawing a candidate split seed: the 31-bit positive
/// integer space named in the split-seed protocol.
const SEED_UPPER_BOUND: i64 = 1 << 31;

/// Tree hyperparameters, built with the teacher's chained-setter convention
/// rather than a positional constructor so new knobs don't change call sites.
#[derive(Clone, Copy, Debug)]
pub struct TreeConfig {
    max_depth: usize,
    min_leaf_size: usize,
    features_to_try: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            min_leaf_size: 1,
            features_to_try: 1,
        }
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size.max(1);
        self
    }

    pub fn features_to_try(mut self, features_to_try: usize) -> Self {
        self.features_to_try = features_to_try.max(1);
        self
    }
}

/// A tree node: either a frozen leaf or an internal split with both children
/// present. There is no "seed = -1 means leaf" sentinel — the two states are
/// distinct enum variants.
#[derive(Clone, Debug)]
pub enum Node {
    Leaf {
        stats: Accumulator,
    },
    Split {
        seed: i64,
        split_value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn size(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => 1 + left.size() + right.size(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.leaves() + right.leaves(),
        }
    }

    fn classify<O: FeatureOracle>(&self, oracle: &O) -> &Accumulator {
        match self {
            Node::Leaf { stats } => stats,
            Node::Split {
                seed,
                split_value,
                left,
                right,
            } => {
                if oracle.feature(*seed) < *split_value {
                    left.classify(oracle)
                } else {
                    right.classify(oracle)
                }
            }
        }
    }
}

/// A single randomized decision tree grown on a bag of samples.
#[derive(Clone, Debug)]
pub struct DecisionTree {
    root: Node,
    error: MeanErrorAccumulator,
}

impl DecisionTree {
    /// Grow a tree on `data` per §4.3: try `config.features_to_try` random
    /// seeds at each node, keep the best improving split (rejecting any that
    /// would leave either side smaller than `config.min_leaf_size`), and
    /// recurse until `config.max_depth` or an unsplittable leaf is reached.
    pub fn grow<O: FeatureOracle, R: Rng>(
        data: &[&Sample<O>],
        config: TreeConfig,
        kind: AccumulatorKind,
        rng: &mut R,
    ) -> Result<Self> {
        let mut owned: Vec<&Sample<O>> = data.to_vec();
        let mut stats = kind.blank();
        for d in owned.iter() {
            stats.add(d.output(), d.weight())?;
        }
        let root = Self::grow_node(&mut owned, stats, config.max_depth, &config, kind, rng)?;
        Ok(Self {
            root,
            error: MeanErrorAccumulator::default(),
        })
    }

    /// Grow the subtree rooted at `data`, given `stats` already accumulated
    /// over exactly that data. Reusing the caller's accumulator (rather than
    /// re-scanning `data`) matters for more than the saved O(n) pass: a
    /// winning split's `left`/`right` accumulators were accumulated in the
    /// split engine's sorted-by-feature-value order, and floating-point
    /// summation is not strictly associative, so recomputing from `data`'s
    /// original order could leave a leaf's frozen stats a few ULPs off from
    /// the very accumulator state that chose the split.
    fn grow_node<O: FeatureOracle, R: Rng>(
        data: &mut [&Sample<O>],
        stats: Accumulator,
        remaining_depth: usize,
        config: &TreeConfig,
        kind: AccumulatorKind,
        rng: &mut R,
    ) -> Result<Node> {
        if data.is_empty() || remaining_depth == 0 {
            trace!(
                "leaf at depth limit or empty data (n={}, remaining_depth={})",
                data.len(),
                remaining_depth
            );
            return Ok(Node::Leaf { stats });
        }

        let mut best_metric = stats.metric()?;
        let mut best: Option<(i64, f64, Accumulator, Accumulator)> = None;

        for _ in 0..config.features_to_try {
            let seed = rng.gen_range(0..SEED_UPPER_BOUND);
            let mut candidate: Vec<&Sample<O>> = data.to_vec();
            let split = continuous_feature_split(&mut candidate, seed, kind)?;

            if split.left_count < config.min_leaf_size || split.right_count < config.min_leaf_size {
                continue;
            }
            if split.composite_metric < best_metric {
                best_metric = split.composite_metric;
                best = Some((seed, split.split_value, split.left, split.right));
            }
        }

        match best {
            None => {
                trace!("no improving split among {} candidates; leaf", config.features_to_try);
                Ok(Node::Leaf { stats })
            }
            Some((seed, split_value, left_stats, right_stats)) => {
                debug!(
                    "split n={} at seed={} value={} (metric {} -> {})",
                    data.len(),
                    seed,
                    split_value,
                    stats.metric()?,
                    best_metric
                );
                let mut left_data: Vec<&Sample<O>> = Vec::with_capacity(data.len());
                let mut right_data: Vec<&Sample<O>> = Vec::with_capacity(data.len());
                for &d in data.iter() {
                    if d.feature(seed) < split_value {
                        left_data.push(d);
                    } else {
                        right_data.push(d);
                    }
                }
                let left =
                    Self::grow_node(&mut left_data, left_stats, remaining_depth - 1, config, kind, rng)?;
                let right =
                    Self::grow_node(&mut right_data, right_stats, remaining_depth - 1, config, kind, rng)?;
                Ok(Node::Split {
                    seed,
                    split_value,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    /// Route `sample`'s feature oracle through the tree and return the
    /// reached leaf's accumulator. Callers call `.estimate()` for a scalar
    /// prediction or inspect the full distribution directly.
    pub fn classify<O: FeatureOracle>(&self, sample: &Sample<O>) -> &Accumulator {
        self.root.classify(sample)
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaves(&self) -> usize {
        self.root.leaves()
    }

    /// This tree's own out-of-bag error estimate, accumulated by the
    /// ensemble trainer as it classifies this tree's OOB set.
    pub fn estimate(&self) -> f64 {
        self.error.estimate()
    }

    pub(crate) fn record_error(&mut self, residual: f64, weight: f64) {
        self.error.add(residual, weight);
    }
}
