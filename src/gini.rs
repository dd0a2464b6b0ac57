use crate::criterion::{ClassificationImpurityData, ImpurityCriterion};
use crate::labels::{self, Labels};

/// Gini impurity `1 - Σ (count / size)²` over class labels `0..number_of_classes`.
#[derive(Debug, Clone)]
pub struct Gini<'a, L: ?Sized> {
    labels: &'a L,
    number_of_classes: usize,
}

impl<'a, L> Gini<'a, L>
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

    pub fn number_of_classes(&self) -> usize {
        self.number_of_classes
    }

    // Σ count² recovered from the impurity: Σ count² = (1 - impurity) * size².
    fn update(&self, sample: usize, data: &mut ClassificationImpurityData, joining: bool) {
        let label = self.labels.get(sample);
        let old_size = data.group_size as f64;
        let old_count = data.class_counts[label] as f64;

        if joining {
            data.class_counts[label] += 1;
            data.group_size += 1;
        } else {
            data.class_counts[label] -= 1;
            data.group_size -= 1;
        }

        if data.group_size == 0 {
            data.impurity = 0.0;
            return;
        }

        let new_size = data.group_size as f64;
        let new_count = data.class_counts[label] as f64;
        let old_sum_of_squares = (1.0 - data.impurity) * old_size * old_size;
        let new_sum_of_squares =
            old_sum_of_squares - old_count * old_count + new_count * new_count;
        data.impurity = (1.0 - new_sum_of_squares / (new_size * new_size)).max(0.0);
    }
}

impl<'a, L> ImpurityCriterion for Gini<'a, L>
where
    L: Labels<usize> + ?Sized,
{
    type Data = ClassificationImpurityData;

    fn sample_count(&self) -> usize {
        self.labels.size()
    }

    fn empty_data(&self) -> Self::Data {
        ClassificationImpurityData::empty(self.number_of_classes)
    }

    fn group_impurity(&self, indices: &[usize]) -> Self::Data {
        let mut data = self.empty_data();
        if indices.is_empty() {
            return data;
        }

        for &i in indices {
            data.class_counts[self.labels.get(i)] += 1;
        }
        data.group_size = indices.len();

        let size = data.group_size as f64;
        let sum_of_squares = data
            .class_counts
            .iter()
            .map(|&c| (c as f64 / size).powi(2))
            .sum::<f64>();
        data.impurity = 1.0 - sum_of_squares;
        data
    }

    fn incremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        self.update(sample, data, true);
    }

    fn decremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        self.update(sample, data, false);
    }
}
