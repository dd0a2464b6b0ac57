pub use bagging::FeatureBagger;
pub use criterion::{
    ClassificationImpurityData, ImpurityCriterion, ImpurityData, PURITY_TOLERANCE,
};
pub use entropy::Entropy;
pub use features::{DenseFeatures, Features, FeaturesError};
pub use gini::Gini;
pub use labels::{number_of_classes, Labels};
pub use mse::{Mse, MseImpurityData};
pub use splitter::{Group, Split, Splitter};
pub use terminal::{MajorityVote, MeanValue, TerminalValue};
pub use trainer::{
    ClassificationTrainer, ConfigError, DecisionTreeTrainer, DecisionTreeTrainerConfig,
    RegressionTrainer, TrainError,
};
pub use tree::{DecisionTreePredictor, NodeId, TreeNode};

pub mod estimation;

mod bagging;
mod criterion;
mod entropy;
mod features;
mod functions;
mod gini;
mod labels;
mod mse;
mod splitter;
mod terminal;
mod trainer;
mod tree;
