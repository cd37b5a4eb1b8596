pub mod accumulator;
pub mod decision_tree;
pub mod random_forest;
pub mod sample;
pub mod split;

pub use accumulator::{Accumulator, AccumulatorKind, EntropyAccumulator, StatAccumulator};
pub use decision_tree::{DecisionTree, Node, TreeConfig};
pub use random_forest::RandomForest;
pub use sample::{FeatureOracle, Sample, SampleKey};
pub use split::{continuous_feature_split, SplitInfo};
