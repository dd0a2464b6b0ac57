use crate::criterion::{ClassificationImpurityData, ImpurityCriterion};
use crate::functions::plogp;
use crate::labels::{self, Labels};

/// Shannon entropy `-Σ p log2(p)` over class labels `0..number_of_classes`.
#[derive(Debug, Clone)]
pub struct Entropy<'a, L: ?Sized> {
    labels: &'a L,
    number_of_classes: usize,
}

impl<'a, L> Entropy<'a, L>
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

    // With S = Σ count * log2(count), entropy = log2(size) - S / size.
    fn update(&self, sample: usize, data: &mut ClassificationImpurityData, joining: bool) {
        let label = self.labels.get(sample);
        let old_size = data.group_size;
        let old_count = data.class_counts[label];

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

        let old_sum = if old_size == 0 {
            0.0
        } else {
            let n = old_size as f64;
            n * (n.log2() - data.impurity)
        };
        let new_sum = old_sum - plogp(old_count) + plogp(data.class_counts[label]);
        let n = data.group_size as f64;
        data.impurity = (n.log2() - new_sum / n).max(0.0);
    }
}

impl<'a, L> ImpurityCriterion for Entropy<'a, L>
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
        data.impurity = data
            .class_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / size;
                -p * p.log2()
            })
            .sum::<f64>();
        data
    }

    fn incremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        self.update(sample, data, true);
    }

    fn decremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        self.update(sample, data, false);
    }
}
