use crate::features::Features;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Position of a node inside [`DecisionTreePredictor`].
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode<P> {
    Leaf {
        prediction: P,
    },
    Split {
        feature_index: usize,
        threshold: f64,
        left: NodeId,
        right: NodeId,
    },
}

impl<P> TreeNode<P> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }
}

/// Trained, immutable decision tree.
///
/// Nodes live in one arena with the root at index `0`; a split node refers to its children by
/// index, so the tree is strictly binary and has no cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreePredictor<P> {
    nodes: Vec<TreeNode<P>>,
}

impl<P: Copy> DecisionTreePredictor<P> {
    pub(crate) fn new(nodes: Vec<TreeNode<P>>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    /// Samples go left when `features[feature_index] < threshold`, and right otherwise.
    pub fn predict(&self, features: &[f64]) -> P {
        match self.nodes[self.leaf_for(features)] {
            TreeNode::Leaf { prediction } => prediction,
            TreeNode::Split { .. } => unreachable!(),
        }
    }

    pub fn leaf_for(&self, features: &[f64]) -> NodeId {
        let mut id = 0;
        while let TreeNode::Split {
            feature_index,
            threshold,
            left,
            right,
        } = self.nodes[id]
        {
            id = if features[feature_index] < threshold {
                left
            } else {
                right
            };
        }
        id
    }

    /// Predicts every sample of `features`, in sample order.
    pub fn predict_all<F>(&self, features: &F, parallel: bool) -> Vec<P>
    where
        F: Features + Sync + ?Sized,
        P: Send + Sync,
    {
        if parallel {
            (0..features.size())
                .into_par_iter()
                .map(|i| self.predict(features.get(i)))
                .collect()
        } else {
            (0..features.size())
                .map(|i| self.predict(features.get(i)))
                .collect()
        }
    }

    pub fn root(&self) -> &TreeNode<P> {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &TreeNode<P> {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[TreeNode<P>] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of levels; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0, 1)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = self.nodes[id] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }
}
