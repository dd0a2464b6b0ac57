use crate::functions;
use crate::labels::{self, Labels};
use std::fmt::Debug;

/// Computes the prediction stored in a leaf from the samples routed to it.
pub trait TerminalValue {
    type Prediction: Copy + Debug + PartialEq + Send + Sync;

    /// Length of the label (or target) array this strategy reads.
    fn sample_count(&self) -> usize;

    /// `indices` is never empty.
    fn to_terminal(&self, indices: &[usize]) -> Self::Prediction;
}

/// Majority class. Ties go to the lowest class id.
#[derive(Debug, Clone)]
pub struct MajorityVote<'a, L: ?Sized> {
    labels: &'a L,
    number_of_classes: usize,
}

impl<'a, L> MajorityVote<'a, L>
where
    L: Labels<usize> + ?Sized,
{
    /// # Panics
    ///
    /// Panics if a label is not below `number_of_classes`.
    pub fn new(labels: &'a L, number_of_classes: usize) -> Self {
        labels::assert_class_labels(labels, number_of_classes);
        Self {
            labels,
            number_of_classes,
        }
    }

    pub fn from_labels(labels: &'a L) -> Self {
        Self::new(labels, labels::number_of_classes(labels))
    }
}

impl<'a, L> TerminalValue for MajorityVote<'a, L>
where
    L: Labels<usize> + ?Sized,
{
    type Prediction = usize;

    fn sample_count(&self) -> usize {
        self.labels.size()
    }

    fn to_terminal(&self, indices: &[usize]) -> usize {
        assert!(!indices.is_empty(), "a leaf must hold at least one sample");
        let mut counts = vec![0; self.number_of_classes];
        for &i in indices {
            counts[self.labels.get(i)] += 1;
        }
        functions::argmax(&counts).expect("never fails")
    }
}

/// Arithmetic mean of the regression targets.
#[derive(Debug, Clone)]
pub struct MeanValue<'a, T: ?Sized> {
    targets: &'a T,
}

impl<'a, T> MeanValue<'a, T>
where
    T: Labels<f64> + ?Sized,
{
    pub fn new(targets: &'a T) -> Self {
        Self { targets }
    }
}

impl<'a, T> TerminalValue for MeanValue<'a, T>
where
    T: Labels<f64> + ?Sized,
{
    type Prediction = f64;

    fn sample_count(&self) -> usize {
        self.targets.size()
    }

    fn to_terminal(&self, indices: &[usize]) -> f64 {
        functions::mean(indices.iter().map(|&i| self.targets.get(i)))
    }
}
