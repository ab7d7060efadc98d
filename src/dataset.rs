//! In-memory supervised dataset.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// A feature matrix (rows are samples) with an aligned label vector.
///
/// Datasets are immutable and meant to be shared behind an `Arc`; fold
/// evaluations materialize their own row subsets with [`select`](Self::select).
///
/// # Examples
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use tuner::Dataset;
///
/// let x = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
/// let y = DVector::from_vec(vec![0.0, 1.0, 0.0]);
/// let data = Dataset::new(x, y).unwrap();
///
/// let (x_sub, y_sub) = data.select(&[2, 0]);
/// assert_eq!(x_sub[(0, 1)], 5.0);
/// assert_eq!(y_sub[1], 0.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    features: DMatrix<f64>,
    labels: DVector<f64>,
}

impl Dataset {
    /// Wraps a feature matrix and its labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] when there are no rows or no columns,
    /// and [`Error::DimensionMismatch`] when the label count differs from
    /// the row count.
    pub fn new(features: DMatrix<f64>, labels: DVector<f64>) -> Result<Self> {
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(Error::EmptyDataset);
        }
        if labels.len() != features.nrows() {
            return Err(Error::DimensionMismatch {
                expected: features.nrows(),
                got: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    /// Builds a dataset from row-major feature rows.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new); ragged rows are a dimension mismatch.
    pub fn from_rows(rows: &[Vec<f64>], labels: Vec<f64>) -> Result<Self> {
        let n_features = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(Error::DimensionMismatch {
                expected: n_features,
                got: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(
            DMatrix::from_row_slice(rows.len(), n_features, &flat),
            DVector::from_vec(labels),
        )
    }

    /// Number of samples (rows).
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    /// Number of features (columns).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    #[must_use]
    pub fn features(&self) -> &DMatrix<f64> {
        &self.features
    }

    #[must_use]
    pub fn labels(&self) -> &DVector<f64> {
        &self.labels
    }

    /// Copies the rows at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range. Indices come from
    /// [`Fold`](crate::Fold)s built for this dataset's size.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> (DMatrix<f64>, DVector<f64>) {
        (
            self.features.select_rows(indices),
            self.labels.select_rows(indices),
        )
    }
}
