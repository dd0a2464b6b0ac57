use crate::bagging::FeatureBagger;
use crate::criterion::{ImpurityCriterion, ImpurityData};
use crate::features::Features;
use crate::splitter::{Group, Split, Splitter};
use crate::terminal::{MajorityVote, MeanValue, TerminalValue};
use crate::tree::{DecisionTreePredictor, NodeId, TreeNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Stopping rules and randomness of a single tree build.
///
/// Checked by [`DecisionTreeTrainerConfig::validate`] when a trainer is created.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeTrainerConfig {
    /// Depth of the deepest split node; the root is at depth 1.
    pub max_depth: usize,
    /// Groups smaller than this become leaves.
    pub min_split_size: usize,
    /// Smallest child a split may produce.
    pub min_leaf_size: usize,
    /// Share of the features considered at each split, in `(0, 1]`.
    pub feature_sampling_ratio: f64,
    /// Seed of the feature bagging; `None` draws one from the thread-local generator.
    pub seed: Option<u64>,
}

impl DecisionTreeTrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn min_split_size(mut self, min_split_size: usize) -> Self {
        self.min_split_size = min_split_size;
        self
    }

    pub fn min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    pub fn feature_sampling_ratio(mut self, ratio: f64) -> Self {
        self.feature_sampling_ratio = ratio;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if self.min_split_size < 2 {
            return Err(ConfigError::MinSplitSizeTooSmall(self.min_split_size));
        }
        if self.min_leaf_size == 0 {
            return Err(ConfigError::ZeroMinLeafSize);
        }
        if self.min_leaf_size >= self.min_split_size {
            return Err(ConfigError::MinLeafSizeNotBelowMinSplitSize {
                min_leaf_size: self.min_leaf_size,
                min_split_size: self.min_split_size,
            });
        }
        let ratio = self.feature_sampling_ratio;
        if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
            return Err(ConfigError::InvalidFeatureSamplingRatio(ratio));
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());
        StdRng::seed_from_u64(seed)
    }
}

impl Default for DecisionTreeTrainerConfig {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            min_split_size: 2,
            min_leaf_size: 1,
            feature_sampling_ratio: 1.0,
            seed: None,
        }
    }
}

/// A split node waiting for its children.
#[derive(Debug)]
struct StackRecord<D> {
    node: NodeId,
    split: Split<D>,
    depth: usize,
}

/// Builds one decision tree without recursion.
///
/// The trainer is generic over the impurity criterion it minimizes and over the strategy
/// computing leaf predictions, which is what distinguishes classification from regression.
#[derive(Debug)]
pub struct DecisionTreeTrainer<'a, F: ?Sized, C, T> {
    features: &'a F,
    criterion: C,
    terminal: T,
    config: DecisionTreeTrainerConfig,
    splitter: Splitter<StdRng>,
    max_stack_size: usize,
}

pub type ClassificationTrainer<'a, F, C, L> = DecisionTreeTrainer<'a, F, C, MajorityVote<'a, L>>;

pub type RegressionTrainer<'a, F, C, T> = DecisionTreeTrainer<'a, F, C, MeanValue<'a, T>>;

impl<'a, F, C, T> DecisionTreeTrainer<'a, F, C, T>
where
    F: Features + ?Sized,
    C: ImpurityCriterion,
    T: TerminalValue,
{
    pub fn new(
        features: &'a F,
        criterion: C,
        terminal: T,
        config: DecisionTreeTrainerConfig,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        let dimension = features.feature_dimension();
        if dimension == 0 {
            return Err(TrainError::ZeroFeatureDimension);
        }

        let bagger = FeatureBagger::new(config.rng(), dimension, config.feature_sampling_ratio);
        let splitter = Splitter::new(bagger, config.min_leaf_size);
        Ok(Self {
            features,
            criterion,
            terminal,
            config,
            splitter,
            max_stack_size: 0,
        })
    }

    pub fn config(&self) -> &DecisionTreeTrainerConfig {
        &self.config
    }

    /// Largest number of pending split records seen during the last [`train`](Self::train) call.
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    pub fn train(
        &mut self,
        training_indices: &[usize],
    ) -> Result<DecisionTreePredictor<T::Prediction>, TrainError> {
        self.check_inputs(training_indices)?;
        tracing::debug!(
            samples = training_indices.len(),
            feature_dimension = self.features.feature_dimension(),
            config = ?self.config,
            "training decision tree"
        );

        let indices = training_indices.to_vec();
        let impurity = self.criterion.group_impurity(&indices);
        let root_group = Group::new(indices, impurity);

        let mut nodes = Vec::new();
        let mut stack = Vec::new();
        self.max_stack_size = 0;

        if root_group.size() < self.config.min_split_size {
            self.add_leaf(&mut nodes, &root_group);
        } else {
            self.split_and_push(&mut nodes, &mut stack, root_group, 1);
        }

        while let Some(record) = stack.pop() {
            let StackRecord { node, split, depth } = record;
            let Split {
                feature_index,
                threshold,
                left,
                right,
                ..
            } = split;

            let left = self.child(&mut nodes, &mut stack, left, depth);
            let right = self.child(&mut nodes, &mut stack, right, depth);
            nodes[node] = Some(TreeNode::Split {
                feature_index,
                threshold,
                left,
                right,
            });
        }

        let nodes = nodes
            .into_iter()
            .map(|n| n.expect("every split record is consumed"))
            .collect();
        let tree = DecisionTreePredictor::new(nodes);
        tracing::debug!(
            nodes = tree.node_count(),
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            max_stack_size = self.max_stack_size,
            "trained decision tree"
        );
        Ok(tree)
    }

    fn check_inputs(&self, training_indices: &[usize]) -> Result<(), TrainError> {
        let size = self.features.size();
        for labels in [self.criterion.sample_count(), self.terminal.sample_count()] {
            if labels != size {
                return Err(TrainError::ShapeMismatch {
                    features: size,
                    labels,
                });
            }
        }

        if training_indices.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }

        if let Some(&index) = training_indices.iter().find(|&&i| i >= size) {
            return Err(TrainError::SampleIndexOutOfRange { index, size });
        }
        Ok(())
    }

    fn child(
        &mut self,
        nodes: &mut Vec<Option<TreeNode<T::Prediction>>>,
        stack: &mut Vec<StackRecord<C::Data>>,
        group: Group<C::Data>,
        depth: usize,
    ) -> NodeId {
        if depth >= self.config.max_depth || group.size() < self.config.min_split_size {
            self.add_leaf(nodes, &group)
        } else {
            self.split_and_push(nodes, stack, group, depth + 1)
        }
    }

    fn split_and_push(
        &mut self,
        nodes: &mut Vec<Option<TreeNode<T::Prediction>>>,
        stack: &mut Vec<StackRecord<C::Data>>,
        group: Group<C::Data>,
        depth: usize,
    ) -> NodeId {
        if group.impurity().is_pure() {
            return self.add_leaf(nodes, &group);
        }

        let split = match self
            .splitter
            .find_best_split(self.features, &self.criterion, &group)
        {
            Some(split) => split,
            None => return self.add_leaf(nodes, &group),
        };
        if split.left.size().min(split.right.size()) < self.config.min_leaf_size {
            return self.add_leaf(nodes, &group);
        }

        tracing::trace!(
            depth,
            feature = split.feature_index,
            threshold = split.threshold,
            loss = split.loss,
            left = split.left.size(),
            right = split.right.size(),
            "split"
        );

        // Filled in once both children exist.
        let node = nodes.len();
        nodes.push(None);
        stack.push(StackRecord { node, split, depth });
        self.max_stack_size = self.max_stack_size.max(stack.len());
        node
    }

    fn add_leaf(
        &self,
        nodes: &mut Vec<Option<TreeNode<T::Prediction>>>,
        group: &Group<C::Data>,
    ) -> NodeId {
        let prediction = self.terminal.to_terminal(group.indices());
        nodes.push(Some(TreeNode::Leaf { prediction }));
        nodes.len() - 1
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max depth must be at least 1")]
    ZeroMaxDepth,

    #[error("min split size must be at least 2, got {0}")]
    MinSplitSizeTooSmall(usize),

    #[error("min leaf size must be at least 1")]
    ZeroMinLeafSize,

    #[error(
        "min leaf size ({min_leaf_size}) must be less than min split size ({min_split_size})"
    )]
    MinLeafSizeNotBelowMinSplitSize {
        min_leaf_size: usize,
        min_split_size: usize,
    },

    #[error("feature sampling ratio must be in (0, 1], got {0}")]
    InvalidFeatureSamplingRatio(f64),
}

#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("features must have at least one dimension")]
    ZeroFeatureDimension,

    #[error("features have {features} samples but labels have {labels}")]
    ShapeMismatch { features: usize, labels: usize },

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("sample index {index} is out of range for {size} samples")]
    SampleIndexOutOfRange { index: usize, size: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::Entropy;
    use crate::estimation;
    use crate::gini::Gini;
    use crate::mse::Mse;
    use proptest::prelude::*;
    use rayon::iter::{IntoParallelIterator, ParallelIterator};
    use std::collections::BTreeMap;

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    fn dataset(
        seed: u64,
        samples: usize,
        dimension: usize,
    ) -> (Vec<Vec<f64>>, Vec<usize>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let features = (0..samples)
            .map(|_| {
                (0..dimension)
                    .map(|_| rng.gen_range(0..8) as f64)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let labels = features
            .iter()
            .map(|xs| {
                let noise = rng.gen_range(0..4);
                if xs[0] + xs[dimension - 1] > 7.0 || noise == 0 {
                    1
                } else {
                    0
                }
            })
            .collect();
        let targets = features
            .iter()
            .map(|xs| 2.0 * xs[0] - xs[dimension - 1] + rng.gen_range(0.0..0.5))
            .collect();
        (features, labels, targets)
    }

    // Training samples grouped by the leaf prediction routes them to.
    fn leaves<P: Copy>(
        tree: &DecisionTreePredictor<P>,
        features: &[Vec<f64>],
        indices: &[usize],
    ) -> BTreeMap<NodeId, Vec<usize>> {
        let mut leaves = BTreeMap::<_, Vec<_>>::new();
        for &i in indices {
            leaves.entry(tree.leaf_for(&features[i])).or_default().push(i);
        }
        leaves
    }

    #[test]
    fn classification_scenario_works() -> Result<(), anyhow::Error> {
        let features = vec![
            vec![0.0, 3.0],
            vec![0.2, 1.0],
            vec![0.4, 4.0],
            vec![0.6, 1.0],
            vec![0.8, 5.0],
            vec![1.0, 9.0],
            vec![1.2, 2.0],
            vec![1.4, 6.0],
            vec![1.6, 5.0],
        ];
        let labels: Vec<usize> = vec![0, 0, 0, 0, 0, 1, 1, 1, 1];
        let config = DecisionTreeTrainerConfig::default()
            .max_depth(2)
            .min_split_size(2)
            .min_leaf_size(1)
            .seed(0);

        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Gini::new(&labels, 2),
            MajorityVote::new(&labels, 2),
            config,
        )?;
        let tree = trainer.train(&all(9))?;

        assert_eq!(
            tree.root(),
            &TreeNode::Split {
                feature_index: 0,
                threshold: 1.0,
                left: 1,
                right: 2,
            }
        );
        assert_eq!(tree.node(1), &TreeNode::Leaf { prediction: 0 });
        assert_eq!(tree.node(2), &TreeNode::Leaf { prediction: 1 });
        assert_eq!(tree.node_count(), 3);

        let gini = Gini::new(&labels, 2);
        for samples in leaves(&tree, &features, &all(9)).values() {
            assert_eq!(gini.group_impurity(samples).impurity(), 0.0);
        }

        assert_eq!(tree.predict(&[0.9, 100.0]), 0);
        assert_eq!(tree.predict(&[1.0, -100.0]), 1);
        Ok(())
    }

    #[test]
    fn regression_scenario_works() -> Result<(), anyhow::Error> {
        let features = vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![10.0],
            vec![11.0],
            vec![12.0],
        ];
        let targets = vec![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let config = DecisionTreeTrainerConfig::default().max_depth(1).seed(0);

        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            config,
        )?;
        let tree = trainer.train(&all(6))?;

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.node(1), &TreeNode::Leaf { prediction: 1.0 });
        assert_eq!(tree.node(2), &TreeNode::Leaf { prediction: 5.0 });
        assert_eq!(tree.predict(&[0.5]), 1.0);
        assert_eq!(tree.predict(&[11.5]), 5.0);
        assert_eq!(trainer.max_stack_size(), 1);
        Ok(())
    }

    #[test]
    fn entropy_trainer_works() -> Result<(), anyhow::Error> {
        let (features, labels, _) = dataset(11, 120, 3);
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Entropy::from_labels(&labels),
            MajorityVote::from_labels(&labels),
            DecisionTreeTrainerConfig::default().max_depth(6).seed(3),
        )?;
        let tree = trainer.train(&all(features.len()))?;
        assert!(tree.depth() <= 7);

        let correct = tree
            .predict_all(&features, false)
            .iter()
            .zip(labels.iter())
            .filter(|(p, l)| p == l)
            .count();
        assert!(correct as f64 / labels.len() as f64 > 0.7);
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cases = [
            (
                DecisionTreeTrainerConfig::default().max_depth(0),
                ConfigError::ZeroMaxDepth,
            ),
            (
                DecisionTreeTrainerConfig::default().min_split_size(1),
                ConfigError::MinSplitSizeTooSmall(1),
            ),
            (
                DecisionTreeTrainerConfig::default().min_leaf_size(0),
                ConfigError::ZeroMinLeafSize,
            ),
            (
                DecisionTreeTrainerConfig::default()
                    .min_split_size(4)
                    .min_leaf_size(4),
                ConfigError::MinLeafSizeNotBelowMinSplitSize {
                    min_leaf_size: 4,
                    min_split_size: 4,
                },
            ),
            (
                DecisionTreeTrainerConfig::default().feature_sampling_ratio(0.0),
                ConfigError::InvalidFeatureSamplingRatio(0.0),
            ),
            (
                DecisionTreeTrainerConfig::default().feature_sampling_ratio(1.5),
                ConfigError::InvalidFeatureSamplingRatio(1.5),
            ),
        ];

        // Labels are deliberately too short: configuration errors come first.
        let features = vec![vec![1.0]; 3];
        let labels: Vec<usize> = vec![0];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected.clone()));
            let result = DecisionTreeTrainer::new(
                &features,
                Gini::new(&labels, 1),
                MajorityVote::new(&labels, 1),
                config,
            );
            assert_eq!(result.err(), Some(TrainError::Config(expected)));
        }

        assert!(DecisionTreeTrainerConfig::default()
            .feature_sampling_ratio(f64::NAN)
            .validate()
            .is_err());
        assert_eq!(DecisionTreeTrainerConfig::new().validate(), Ok(()));
    }

    #[test]
    fn zero_feature_dimension_is_rejected() {
        let features: Vec<Vec<f64>> = vec![vec![]; 2];
        let targets = vec![1.0, 2.0];
        let result = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            DecisionTreeTrainerConfig::default(),
        );
        assert_eq!(result.err(), Some(TrainError::ZeroFeatureDimension));
    }

    #[test]
    fn malformed_training_input_is_rejected() -> Result<(), anyhow::Error> {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let short = vec![1.0, 2.0];
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&short),
            MeanValue::new(&short),
            DecisionTreeTrainerConfig::default(),
        )?;
        assert_eq!(
            trainer.train(&all(2)).err(),
            Some(TrainError::ShapeMismatch {
                features: 3,
                labels: 2
            })
        );

        let targets = vec![1.0, 2.0, 3.0];
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            DecisionTreeTrainerConfig::default(),
        )?;
        assert_eq!(trainer.train(&[]).err(), Some(TrainError::EmptyTrainingSet));
        assert_eq!(
            trainer.train(&[0, 3]).err(),
            Some(TrainError::SampleIndexOutOfRange { index: 3, size: 3 })
        );
        Ok(())
    }

    #[test]
    fn small_or_pure_groups_become_single_leaves() -> Result<(), anyhow::Error> {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let labels: Vec<usize> = vec![0, 1, 1, 1];

        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Gini::new(&labels, 2),
            MajorityVote::new(&labels, 2),
            DecisionTreeTrainerConfig::default().min_split_size(5),
        )?;
        let tree = trainer.train(&all(4))?;
        assert_eq!(tree.nodes(), &[TreeNode::Leaf { prediction: 1 }]);
        assert_eq!(trainer.max_stack_size(), 0);

        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Gini::new(&labels, 2),
            MajorityVote::new(&labels, 2),
            DecisionTreeTrainerConfig::default(),
        )?;
        let tree = trainer.train(&[1, 2, 3])?;
        assert_eq!(tree.nodes(), &[TreeNode::Leaf { prediction: 1 }]);

        let targets = vec![0.3; 4];
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            DecisionTreeTrainerConfig::default(),
        )?;
        let tree = trainer.train(&all(4))?;
        assert_eq!(tree.node_count(), 1);
        Ok(())
    }

    #[test]
    fn large_offset_targets_are_still_split() -> Result<(), anyhow::Error> {
        let features = (0..6).map(|i| vec![i as f64]).collect::<Vec<_>>();
        let targets = vec![1e6, 1e6, 1e6, 1e6 + 1.0, 1e6 + 1.0, 1e6 + 1.0];
        let config = DecisionTreeTrainerConfig::default().max_depth(1).seed(0);

        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            config,
        )?;
        let tree = trainer.train(&all(6))?;

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.predict(&[1.0]), 1e6);
        assert_eq!(tree.predict(&[4.0]), 1e6 + 1.0);
        Ok(())
    }

    #[test]
    fn inseparable_group_becomes_leaf() -> Result<(), anyhow::Error> {
        let features = vec![vec![1.0, 1.0]; 5];
        let labels: Vec<usize> = vec![0, 1, 1, 0, 1];
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Gini::new(&labels, 2),
            MajorityVote::new(&labels, 2),
            DecisionTreeTrainerConfig::default(),
        )?;
        let tree = trainer.train(&all(5))?;
        assert_eq!(tree.nodes(), &[TreeNode::Leaf { prediction: 1 }]);
        Ok(())
    }

    #[test]
    fn fully_grown_tree_memorizes_training_set() -> Result<(), anyhow::Error> {
        let n = 2_000;
        let features = (0..n).map(|i| vec![i as f64]).collect::<Vec<_>>();
        let targets = (0..n).map(|i| ((i * 7) % n) as f64).collect::<Vec<_>>();
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Mse::new(&targets),
            MeanValue::new(&targets),
            DecisionTreeTrainerConfig::default().seed(1),
        )?;
        let tree = trainer.train(&all(n))?;
        assert_eq!(tree.leaf_count(), n);
        assert_eq!(tree.node_count(), 2 * n - 1);
        for (xs, &y) in features.iter().zip(targets.iter()) {
            assert_eq!(tree.predict(xs), y);
        }
        Ok(())
    }

    #[test]
    fn deep_trees_are_built_without_recursion() -> Result<(), anyhow::Error> {
        // With alternating labels, peeling a single sample off either end is always the best
        // Gini split, so the tree degenerates into a chain as deep as the sample count.
        let n = 1_000;
        let features = (0..n).map(|i| vec![i as f64]).collect::<Vec<_>>();
        let labels = (0..n).map(|i| i % 2).collect::<Vec<usize>>();
        let mut trainer = DecisionTreeTrainer::new(
            &features,
            Gini::new(&labels, 2),
            MajorityVote::new(&labels, 2),
            DecisionTreeTrainerConfig::default(),
        )?;
        let tree = trainer.train(&all(n))?;
        assert_eq!(tree.leaf_count(), n);
        assert_eq!(tree.depth(), n);
        assert!(trainer.max_stack_size() <= 2);
        for (xs, &label) in features.iter().zip(labels.iter()) {
            assert_eq!(tree.predict(xs), label);
        }
        Ok(())
    }

    #[test]
    fn same_seed_same_tree() -> Result<(), anyhow::Error> {
        let (features, labels, targets) = dataset(5, 300, 6);
        let config = DecisionTreeTrainerConfig::default()
            .max_depth(8)
            .min_split_size(4)
            .min_leaf_size(2)
            .feature_sampling_ratio(0.5)
            .seed(1234);

        let train_classifier = || -> Result<_, TrainError> {
            DecisionTreeTrainer::new(
                &features,
                Gini::new(&labels, 2),
                MajorityVote::new(&labels, 2),
                config.clone(),
            )?
            .train(&all(features.len()))
        };
        assert_eq!(train_classifier()?, train_classifier()?);

        let train_regressor = || -> Result<_, TrainError> {
            DecisionTreeTrainer::new(
                &features,
                Mse::new(&targets),
                MeanValue::new(&targets),
                config.clone(),
            )?
            .train(&all(features.len()))
        };
        assert_eq!(train_regressor()?, train_regressor()?);
        Ok(())
    }

    #[test]
    fn independent_trees_train_in_parallel() -> Result<(), anyhow::Error> {
        let (features, _, targets) = dataset(8, 200, 4);
        let train = |seed: u64| -> Result<_, TrainError> {
            let config = DecisionTreeTrainerConfig::default()
                .max_depth(5)
                .feature_sampling_ratio(0.5)
                .seed(seed);
            DecisionTreeTrainer::new(
                &features,
                Mse::new(&targets),
                MeanValue::new(&targets),
                config,
            )?
            .train(&all(features.len()))
        };

        let parallel = (0..8u64)
            .into_par_iter()
            .map(train)
            .collect::<Result<Vec<_>, _>>()?;
        let sequential = (0..8u64).map(train).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(parallel, sequential);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn leaves_agree_with_routed_samples(
            seed in any::<u64>(),
            samples in 1usize..120,
            dimension in 1usize..5,
            max_depth in 1usize..8,
            min_split_size in 2usize..8,
            leaf_offset in 0usize..8,
        ) {
            let min_leaf_size = 1 + leaf_offset % (min_split_size - 1);
            let (features, labels, targets) = dataset(seed, samples, dimension);
            let indices = all(samples);
            let config = DecisionTreeTrainerConfig::default()
                .max_depth(max_depth)
                .min_split_size(min_split_size)
                .min_leaf_size(min_leaf_size)
                .feature_sampling_ratio(0.7)
                .seed(seed);

            let vote = MajorityVote::new(&labels, 2);
            let mut trainer = DecisionTreeTrainer::new(
                &features,
                Gini::new(&labels, 2),
                vote.clone(),
                config.clone(),
            ).unwrap();
            let tree = trainer.train(&indices).unwrap();
            let routed = leaves(&tree, &features, &indices);
            prop_assert_eq!(routed.len(), tree.leaf_count());
            for (&leaf, samples) in &routed {
                prop_assert_eq!(tree.node(leaf), &TreeNode::Leaf { prediction: vote.to_terminal(samples) });
                if tree.node_count() > 1 {
                    prop_assert!(samples.len() >= min_leaf_size);
                }
            }

            let mean = MeanValue::new(&targets);
            let mut trainer = DecisionTreeTrainer::new(
                &features,
                Mse::new(&targets),
                mean.clone(),
                config,
            ).unwrap();
            let tree = trainer.train(&indices).unwrap();
            let routed = leaves(&tree, &features, &indices);
            prop_assert_eq!(routed.len(), tree.leaf_count());
            for (&leaf, samples) in &routed {
                match tree.node(leaf) {
                    TreeNode::Leaf { prediction } => {
                        prop_assert!((prediction - mean.to_terminal(samples)).abs() < 1e-9);
                    }
                    TreeNode::Split { .. } => prop_assert!(false, "routed to a split node"),
                }
            }
        }

        #[test]
        fn memory_bounds_are_sound(
            seed in any::<u64>(),
            samples in 1usize..150,
            max_depth in 1usize..12,
            min_split_size in 2usize..10,
            leaf_offset in 0usize..10,
        ) {
            let min_leaf_size = 1 + leaf_offset % (min_split_size - 1);
            let (features, _, targets) = dataset(seed, samples, 3);
            let config = DecisionTreeTrainerConfig::default()
                .max_depth(max_depth)
                .min_split_size(min_split_size)
                .min_leaf_size(min_leaf_size)
                .seed(seed);

            let mut trainer = DecisionTreeTrainer::new(
                &features,
                Mse::new(&targets),
                MeanValue::new(&targets),
                config,
            ).unwrap();
            let tree = trainer.train(&all(samples)).unwrap();

            prop_assert!(tree.leaf_count() <= estimation::estimate_number_of_leaves(
                max_depth, min_split_size, min_leaf_size, samples));
            prop_assert!(tree.node_count() <= estimation::estimate_number_of_nodes(
                max_depth, min_split_size, min_leaf_size, samples));
            prop_assert!(trainer.max_stack_size() <= estimation::estimate_max_stack_size(
                max_depth, min_split_size, samples));
            prop_assert!(tree.depth() <= max_depth + 1);
        }
    }
}
