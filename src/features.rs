use itertools::Itertools as _;
use thiserror::Error;

/// Read-only provider of one fixed-length feature vector per sample.
pub trait Features {
    /// Number of samples.
    fn size(&self) -> usize;

    /// Length of every vector returned by [`Features::get`].
    fn feature_dimension(&self) -> usize;

    fn get(&self, index: usize) -> &[f64];
}

impl Features for [Vec<f64>] {
    fn size(&self) -> usize {
        self.len()
    }

    fn feature_dimension(&self) -> usize {
        self.first().map_or(0, |row| row.len())
    }

    fn get(&self, index: usize) -> &[f64] {
        &self[index]
    }
}

impl Features for Vec<Vec<f64>> {
    fn size(&self) -> usize {
        self.as_slice().size()
    }

    fn feature_dimension(&self) -> usize {
        self.as_slice().feature_dimension()
    }

    fn get(&self, index: usize) -> &[f64] {
        &self[index]
    }
}

/// Row-major dense feature matrix.
#[derive(Debug, Clone)]
pub struct DenseFeatures {
    values: Vec<f64>,
    dimension: usize,
}

impl DenseFeatures {
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, FeaturesError> {
        if rows.is_empty() {
            return Err(FeaturesError::EmptyRows);
        }

        let dimension = rows[0].len();
        if dimension == 0 {
            return Err(FeaturesError::ZeroFeatureDimension);
        }

        if !rows.iter().map(|r| r.len()).all_equal() {
            let row = rows
                .iter()
                .position(|r| r.len() != dimension)
                .expect("never fails");
            return Err(FeaturesError::RowSizeMismatch { row });
        }

        let values = rows.iter().flatten().copied().collect::<Vec<_>>();
        Self::from_flat(values, dimension)
    }

    /// Builds a matrix from the columns of a column-major table.
    pub fn from_columns(columns: &[&[f64]]) -> Result<Self, FeaturesError> {
        if columns.is_empty() {
            return Err(FeaturesError::ZeroFeatureDimension);
        }

        let rows_len = columns[0].len();
        if rows_len == 0 {
            return Err(FeaturesError::EmptyRows);
        }

        if let Some((column, _)) = columns.iter().find_position(|c| c.len() != rows_len) {
            return Err(FeaturesError::ColumnSizeMismatch { column });
        }

        let values = (0..rows_len)
            .flat_map(|row| columns.iter().map(move |c| c[row]))
            .collect();
        Self::from_flat(values, columns.len())
    }

    fn from_flat(values: Vec<f64>, dimension: usize) -> Result<Self, FeaturesError> {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(FeaturesError::NonFiniteValue {
                row: i / dimension,
                feature: i % dimension,
            });
        }
        Ok(Self { values, dimension })
    }

    pub fn rows(&self) -> impl '_ + Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.dimension)
    }
}

impl Features for DenseFeatures {
    fn size(&self) -> usize {
        self.values.len() / self.dimension
    }

    fn feature_dimension(&self) -> usize {
        self.dimension
    }

    fn get(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.values[start..start + self.dimension]
    }
}

#[derive(Debug, Error, Clone)]
pub enum FeaturesError {
    #[error("features must have at least one row")]
    EmptyRows,

    #[error("features must have at least one column")]
    ZeroFeatureDimension,

    #[error("row {row} has a different feature count from the first row")]
    RowSizeMismatch { row: usize },

    #[error("column {column} has a different row count from the first column")]
    ColumnSizeMismatch { column: usize },

    #[error("feature {feature} of row {row} is not a finite number")]
    NonFiniteValue { row: usize, feature: usize },
}
