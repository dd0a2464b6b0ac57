use crate::criterion::{ImpurityCriterion, ImpurityData, PURITY_TOLERANCE};
use crate::labels::Labels;

/// Mean squared error around the group mean, `E[x²] - E[x]²`.
#[derive(Debug, Clone)]
pub struct Mse<'a, T: ?Sized> {
    targets: &'a T,
}

impl<'a, T> Mse<'a, T>
where
    T: Labels<f64> + ?Sized,
{
    pub fn new(targets: &'a T) -> Self {
        Self { targets }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MseImpurityData {
    sum: f64,
    sum_of_squares: f64,
    group_size: usize,
    impurity: f64,
}

impl MseImpurityData {
    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.sum_of_squares
    }

    fn refresh(&mut self) {
        if self.group_size == 0 {
            *self = Self::default();
            return;
        }
        let n = self.group_size as f64;
        let mean = self.sum / n;
        self.impurity = (self.sum_of_squares / n - mean * mean).max(0.0);
    }
}

impl ImpurityData for MseImpurityData {
    fn impurity(&self) -> f64 {
        self.impurity
    }

    fn group_size(&self) -> usize {
        self.group_size
    }

    // Rounding error of `E[x²] - E[x]²` is a few ulps of `E[x²]`.
    fn is_pure(&self) -> bool {
        if self.group_size == 0 {
            return true;
        }
        let mean_of_squares = self.sum_of_squares / self.group_size as f64;
        self.impurity <= PURITY_TOLERANCE.max(8.0 * f64::EPSILON * mean_of_squares)
    }
}

impl<'a, T> ImpurityCriterion for Mse<'a, T>
where
    T: Labels<f64> + ?Sized,
{
    type Data = MseImpurityData;

    fn sample_count(&self) -> usize {
        self.targets.size()
    }

    fn empty_data(&self) -> Self::Data {
        MseImpurityData::default()
    }

    fn group_impurity(&self, indices: &[usize]) -> Self::Data {
        let mut data = MseImpurityData::default();
        for &i in indices {
            let y = self.targets.get(i);
            data.sum += y;
            data.sum_of_squares += y * y;
        }
        data.group_size = indices.len();
        data.refresh();
        data
    }

    fn incremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        let y = self.targets.get(sample);
        data.sum += y;
        data.sum_of_squares += y * y;
        data.group_size += 1;
        data.refresh();
    }

    fn decremental_impurity(&self, sample: usize, data: &mut Self::Data) {
        let y = self.targets.get(sample);
        data.sum -= y;
        data.sum_of_squares -= y * y;
        data.group_size -= 1;
        data.refresh();
    }
}
