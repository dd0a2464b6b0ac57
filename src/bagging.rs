use rand::Rng;

/// Draws the features considered at one split, uniformly without replacement.
///
/// The bagger owns its random source, so every concurrently built tree needs its own instance.
#[derive(Debug)]
pub struct FeatureBagger<R> {
    rng: R,
    total_features: usize,
    sample_size: usize,
}

impl<R: Rng> FeatureBagger<R> {
    /// `ratio` must lie in `(0, 1]`; callers validate it beforehand.
    pub fn new(rng: R, total_features: usize, ratio: f64) -> Self {
        debug_assert!(ratio > 0.0 && ratio <= 1.0);
        let sample_size =
            ((ratio * total_features as f64).ceil() as usize).clamp(1, total_features.max(1));
        Self {
            rng,
            total_features,
            sample_size,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Returns `ceil(ratio * total_features)` distinct feature indices.
    pub fn sample(&mut self) -> Vec<usize> {
        if self.sample_size >= self.total_features {
            return (0..self.total_features).collect();
        }
        rand::seq::index::sample(&mut self.rng, self.total_features, self.sample_size).into_vec()
    }
}
