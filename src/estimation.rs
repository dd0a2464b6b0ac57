//! Closed-form upper bounds on the size of a tree build.
//!
//! All functions are pure, so a caller can reject a training request that would not fit into
//! its memory budget before any sample is touched.
use crate::trainer::DecisionTreeTrainerConfig;
use crate::tree::TreeNode;
use std::mem;
use std::ops::Add;

/// Upper bound on the number of leaves.
///
/// A tree with split nodes at depths `1..=max_depth` has at most `2^max_depth` leaves, and
/// every leaf holds at least `min_leaf_size` samples. Each split node holds at least
/// `min_split_size` samples, which allows at most `samples - min_split_size + 2` leaves.
pub fn estimate_number_of_leaves(
    max_depth: usize,
    min_split_size: usize,
    min_leaf_size: usize,
    number_of_training_samples: usize,
) -> usize {
    let samples = number_of_training_samples as f64;
    let by_depth = 2f64.powi(max_depth.min(i32::MAX as usize) as i32);
    let by_leaf_size = samples / min_leaf_size.max(1) as f64;
    let by_split_size = (number_of_training_samples + 2)
        .saturating_sub(min_split_size)
        .max(1) as f64;

    let leaves = by_depth.min(by_leaf_size).min(by_split_size).ceil();
    if leaves >= usize::MAX as f64 {
        usize::MAX
    } else {
        (leaves as usize).max(1)
    }
}

pub fn estimate_number_of_nodes(
    max_depth: usize,
    min_split_size: usize,
    min_leaf_size: usize,
    number_of_training_samples: usize,
) -> usize {
    let leaves = estimate_number_of_leaves(
        max_depth,
        min_split_size,
        min_leaf_size,
        number_of_training_samples,
    );
    leaves.saturating_mul(2) - 1
}

/// Upper bound on the number of pending split records held by the trainer at once.
pub fn estimate_max_stack_size(
    max_depth: usize,
    min_split_size: usize,
    number_of_training_samples: usize,
) -> usize {
    let by_samples = (number_of_training_samples + 2)
        .saturating_sub(min_split_size)
        .max(1);
    max_depth.min(by_samples).saturating_mul(2)
}

/// Inclusive range of byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryRange {
    pub min: usize,
    pub max: usize,
}

impl MemoryRange {
    pub fn of(bytes: usize) -> Self {
        Self::between(bytes, bytes)
    }

    pub fn between(min: usize, max: usize) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    pub fn times(self, count: usize) -> Self {
        Self::between(
            self.min.saturating_mul(count),
            self.max.saturating_mul(count),
        )
    }
}

impl Add for MemoryRange {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::between(
            self.min.saturating_add(other.min),
            self.max.saturating_add(other.max),
        )
    }
}

/// Bytes needed to train a tree with predictions of type `P`.
///
/// `impurity_data_bytes` is the heap size of one impurity summary: the class-count vector of the
/// classification criteria, or zero for MSE.
pub fn memory_estimation<P>(
    config: &DecisionTreeTrainerConfig,
    number_of_training_samples: usize,
    impurity_data_bytes: usize,
) -> MemoryRange {
    let indices = MemoryRange::of(mem::size_of::<usize>()).times(number_of_training_samples);
    // Root group, plus the current and best scratch buffers of the splitter.
    let scratch = indices.times(3);

    let node = mem::size_of::<Option<TreeNode<P>>>();
    let max_nodes = estimate_number_of_nodes(
        config.max_depth,
        config.min_split_size,
        config.min_leaf_size,
        number_of_training_samples,
    );
    let tree = MemoryRange::between(node, node.saturating_mul(max_nodes));

    // A stack record holds a split with two groups, each with an impurity summary.
    let record = 2 * (mem::size_of::<Vec<usize>>() + impurity_data_bytes) + 64;
    let max_records = estimate_max_stack_size(
        config.max_depth,
        config.min_split_size,
        number_of_training_samples,
    );
    let stack = MemoryRange::between(0, record.saturating_mul(max_records));

    // Feature sweep: left, right and the best pair found so far.
    let impurity = MemoryRange::of(impurity_data_bytes).times(4);

    scratch + tree + stack + impurity
}
