use crate::bagging::FeatureBagger;
use crate::criterion::{ImpurityCriterion, ImpurityData};
use crate::features::Features;
use ordered_float::OrderedFloat;
use rand::Rng;
use std::cmp::Ordering;

/// Samples of a not yet finalized node, together with their impurity statistics.
#[derive(Debug, Clone)]
pub struct Group<D> {
    indices: Vec<usize>,
    impurity: D,
}

impl<D: ImpurityData> Group<D> {
    pub fn new(indices: Vec<usize>, impurity: D) -> Self {
        debug_assert_eq!(indices.len(), impurity.group_size());
        Self { indices, impurity }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn impurity(&self) -> &D {
        &self.impurity
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }
}

/// Partition of a group into `feature < threshold` (left) and `feature >= threshold` (right).
#[derive(Debug, Clone)]
pub struct Split<D> {
    pub feature_index: usize,
    pub threshold: f64,
    /// Size-weighted impurity of the two children.
    pub loss: f64,
    pub left: Group<D>,
    pub right: Group<D>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    loss: f64,
    feature_index: usize,
    threshold: f64,
    left_size: usize,
}

/// Finds the best split of a group with a sort-then-sweep over the sampled features.
///
/// `current` and `best` are scratch buffers sized like the group under inspection.
/// They are swapped, never copied, when a feature beats the best split so far.
#[derive(Debug)]
pub struct Splitter<R> {
    bagger: FeatureBagger<R>,
    min_leaf_size: usize,
    current: Vec<usize>,
    best: Vec<usize>,
}

impl<R: Rng> Splitter<R> {
    pub fn new(bagger: FeatureBagger<R>, min_leaf_size: usize) -> Self {
        Self {
            bagger,
            min_leaf_size: min_leaf_size.max(1),
            current: Vec::new(),
            best: Vec::new(),
        }
    }

    /// Returns `None` when no sampled feature separates the group into two
    /// children holding at least `min_leaf_size` samples each.
    pub fn find_best_split<F, C>(
        &mut self,
        features: &F,
        criterion: &C,
        group: &Group<C::Data>,
    ) -> Option<Split<C::Data>>
    where
        F: Features + ?Sized,
        C: ImpurityCriterion,
    {
        let size = group.size();
        if size < self.min_leaf_size.saturating_mul(2) {
            return None;
        }

        let mut best: Option<Candidate> = None;
        for feature_index in self.bagger.sample() {
            self.current.clear();
            self.current.extend_from_slice(group.indices());
            self.current
                .sort_by_key(|&i| OrderedFloat(features.get(i)[feature_index]));

            let mut bar = best.as_ref().map_or(f64::INFINITY, |b| b.loss);
            let mut feature_best: Option<Candidate> = None;
            let mut left = criterion.empty_data();
            let mut right = group.impurity().clone();

            for position in 0..size - 1 {
                let sample = self.current[position];
                criterion.incremental_impurity(sample, &mut left);
                criterion.decremental_impurity(sample, &mut right);

                let left_size = position + 1;
                if left_size < self.min_leaf_size {
                    continue;
                }
                if size - left_size < self.min_leaf_size {
                    break;
                }

                // Equal values cannot be separated by a threshold. NaNs sort last and never qualify.
                let value = features.get(sample)[feature_index];
                let threshold = features.get(self.current[position + 1])[feature_index];
                if value.partial_cmp(&threshold) != Some(Ordering::Less) {
                    continue;
                }

                let loss = criterion.combined_impurity(&left, &right);
                if loss < bar {
                    bar = loss;
                    feature_best = Some(Candidate {
                        loss,
                        feature_index,
                        threshold,
                        left_size,
                    });
                }
            }

            if feature_best.is_some() {
                std::mem::swap(&mut self.current, &mut self.best);
                best = feature_best;
            }
        }

        let best = best?;
        let mut left_indices = std::mem::take(&mut self.best);
        let right_indices = left_indices.split_off(best.left_size);
        // Exact statistics for the children; the running ones of the sweep carry rounding error.
        let left = criterion.group_impurity(&left_indices);
        let right = criterion.group_impurity(&right_indices);
        Some(Split {
            feature_index: best.feature_index,
            threshold: best.threshold,
            loss: best.loss,
            left: Group::new(left_indices, left),
            right: Group::new(right_indices, right),
        })
    }
}
