use std::fmt::Debug;

/// Impurities at or below this value are treated as zero.
pub const PURITY_TOLERANCE: f64 = 1e-12;

/// Sufficient statistics of a group of samples plus the impurity derived from them.
pub trait ImpurityData: Clone + Debug {
    fn impurity(&self) -> f64;

    fn group_size(&self) -> usize;

    /// Whether no split of this group can lower its impurity.
    fn is_pure(&self) -> bool {
        self.impurity() <= PURITY_TOLERANCE
    }
}

/// Loss that the splitter minimizes.
///
/// `incremental_impurity` and `decremental_impurity` must run in constant time:
/// the splitter calls them once per sample and candidate feature.
pub trait ImpurityCriterion {
    type Data: ImpurityData;

    /// Length of the label (or target) array this criterion reads.
    fn sample_count(&self) -> usize;

    /// Statistics of an empty group.
    fn empty_data(&self) -> Self::Data;

    /// Computes the statistics of `indices` from scratch.
    fn group_impurity(&self, indices: &[usize]) -> Self::Data;

    /// Updates `data` for `sample` joining the group.
    fn incremental_impurity(&self, sample: usize, data: &mut Self::Data);

    /// Updates `data` for `sample` leaving the group.
    fn decremental_impurity(&self, sample: usize, data: &mut Self::Data);

    /// Size-weighted mean of the two impurities.
    fn combined_impurity(&self, left: &Self::Data, right: &Self::Data) -> f64 {
        let left_size = left.group_size() as f64;
        let right_size = right.group_size() as f64;
        let total = left_size + right_size;
        if total == 0.0 {
            return 0.0;
        }
        (left_size * left.impurity() + right_size * right.impurity()) / total
    }
}

/// Per-class counts shared by the classification criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationImpurityData {
    pub(crate) class_counts: Vec<usize>,
    pub(crate) group_size: usize,
    pub(crate) impurity: f64,
}

impl ClassificationImpurityData {
    pub(crate) fn empty(number_of_classes: usize) -> Self {
        Self {
            class_counts: vec![0; number_of_classes],
            group_size: 0,
            impurity: 0.0,
        }
    }

    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }
}

impl ImpurityData for ClassificationImpurityData {
    fn impurity(&self) -> f64 {
        self.impurity
    }

    fn group_size(&self) -> usize {
        self.group_size
    }
}
