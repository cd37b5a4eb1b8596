/*!
This crate grows randomized decision tree forests for supervised
classification and regression, on tabular (vector-valued) or image inputs.

Each tree is grown on a bootstrap bag of the training samples; the
remaining out-of-bag (OOB) third is classified by the freshly grown tree
and accumulated into each sample's own OOB accumulator, so the ensemble's
generalization error can be estimated without a held-out test set.

# Available components

## Accumulators
- [`algorithms::trees::accumulator::StatAccumulator`]: running sum / sum-of-squares for regression targets
- [`algorithms::trees::accumulator::EntropyAccumulator`]: per-category counts for classification targets

## Tree-based methods
- [`algorithms::trees::decision_tree::DecisionTree`]: a single randomized decision tree
- [`algorithms::trees::random_forest::RandomForest`]: bagging ensemble with OOB error estimation

## Image features
- [`image::ImageOracleTable`]: integral-image cumulants backing an online random-feature oracle for greyscale images

# Usage Example

```rust,no_run
use blocks_ml_forest::algorithms::trees::accumulator::AccumulatorKind;
use blocks_ml_forest::algorithms::trees::decision_tree::TreeConfig;
use blocks_ml_forest::algorithms::trees::random_forest::RandomForest;
use blocks_ml_forest::algorithms::trees::sample::{Sample, SampleKey, TabularOracle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

let samples: Vec<Sample<TabularOracle>> = vec![
    Sample::new(SampleKey::from(0), 1.0, 0.0, 2, TabularOracle::new(vec![0.0, 1.0])),
    Sample::new(SampleKey::from(1), 1.0, 1.0, 2, TabularOracle::new(vec![1.0, 0.0])),
];

let config = TreeConfig::new().features_to_try(8).max_depth(10);
let mut forest = RandomForest::new();
let mut rng = ChaCha8Rng::seed_from_u64(0);
forest
    .add_trees(100, &samples, config, AccumulatorKind::Classification { categories: 2 }, &mut rng)
    .expect("training should not hit an invariant violation");

let oob_error = forest.error(&samples);
```

# Features
- `parallel`: grow an ensemble's trees concurrently with rayon (default-on)
- `serde-support`: enable serialization/deserialization support for ndarray-backed image buffers
*/

pub mod algorithms;
pub mod error;
pub mod image;
pub mod ingest;
mod utils;

pub use error::{Error, Result};
