//! Reference transformer stages.

use nalgebra::{DMatrix, DVector, RowDVector};

use super::{Transformer, check_width};
use crate::error::{Error, Result};

/// Centers each column to zero mean and scales it to unit variance.
///
/// Constant columns are centered but not scaled.
#[derive(Clone, Debug, Default)]
pub struct StandardScaler {
    mean: Option<RowDVector<f64>>,
    scale: Option<RowDVector<f64>>,
}

impl StandardScaler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted column means.
    #[must_use]
    pub fn mean(&self) -> Option<&RowDVector<f64>> {
        self.mean.as_ref()
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &DMatrix<f64>, _y: &DVector<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }
        let mean = x.row_mean();
        let scale = x
            .row_variance()
            .map(|v| if v > f64::EPSILON { v.sqrt() } else { 1.0 });
        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(Error::NotFitted("StandardScaler".into()));
        };
        check_width(mean.len(), x)?;
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - mean[j]) / scale[j]
        }))
    }
}

/// Rescales each column to `[0, 1]` using the training minimum and range.
///
/// Rows outside the training range map outside `[0, 1]`; constant columns
/// map to 0.
#[derive(Clone, Debug, Default)]
pub struct MinMaxScaler {
    min: Option<RowDVector<f64>>,
    range: Option<RowDVector<f64>>,
}

impl MinMaxScaler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for MinMaxScaler {
    fn fit(&mut self, x: &DMatrix<f64>, _y: &DVector<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }
        let min = RowDVector::from_fn(x.ncols(), |_, j| x.column(j).min());
        let range = RowDVector::from_fn(x.ncols(), |_, j| {
            let r = x.column(j).max() - min[j];
            if r > f64::EPSILON { r } else { 1.0 }
        });
        self.min = Some(min);
        self.range = Some(range);
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (Some(min), Some(range)) = (&self.min, &self.range) else {
            return Err(Error::NotFitted("MinMaxScaler".into()));
        };
        check_width(min.len(), x)?;
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - min[j]) / range[j]
        }))
    }
}

/// Keeps the `k` columns with the largest absolute Pearson correlation with
/// the label.
///
/// Ties keep the lower column index. Selected columns keep their original
/// relative order.
#[derive(Clone, Debug)]
pub struct SelectKBest {
    k: usize,
    n_features: usize,
    selected: Option<Vec<usize>>,
}

impl SelectKBest {
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            n_features: 0,
            selected: None,
        }
    }

    /// Indices of the kept columns, once fitted.
    #[must_use]
    pub fn selected(&self) -> Option<&[usize]> {
        self.selected.as_deref()
    }
}

/// |corr(a, b)|, or 0 when either side is constant.
fn abs_correlation(a: &[f64], b: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (da, db) = (x - mean_a, y - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (cov / denom).abs()
    }
}

impl Transformer for SelectKBest {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        if self.k == 0 || self.k > x.ncols() {
            return Err(Error::FitFailed {
                stage: "SelectKBest".into(),
                reason: format!("k = {} must be in 1..={}", self.k, x.ncols()),
            });
        }
        let labels = y.as_slice();
        let mut scored: Vec<(usize, f64)> = (0..x.ncols())
            .map(|j| {
                let column: Vec<f64> = x.column(j).iter().copied().collect();
                (j, abs_correlation(&column, labels))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut selected: Vec<usize> = scored.iter().take(self.k).map(|(j, _)| *j).collect();
        selected.sort_unstable();
        self.n_features = x.ncols();
        self.selected = Some(selected);
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let Some(selected) = &self.selected else {
            return Err(Error::NotFitted("SelectKBest".into()));
        };
        check_width(self.n_features, x)?;
        Ok(x.select_columns(selected))
    }
}

/// Identity stage; lets a categorical step choose "no preprocessing".
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Transformer for Passthrough {
    fn fit(&mut self, _x: &DMatrix<f64>, _y: &DVector<f64>) -> Result<()> {
        Ok(())
    }

    fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        Ok(x.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 10.0, 5.0, //
                2.0, 20.0, 5.0, //
                3.0, 10.0, 5.0, //
                4.0, 20.0, 5.0,
            ],
        );
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        (x, y)
    }

    #[test]
    fn standard_scaler_centers_and_scales() {
        let (x, y) = data();
        let mut scaler = StandardScaler::new();
        scaler.fit(&x, &y).unwrap();
        let z = scaler.transform(&x).unwrap();
        for j in 0..2 {
            let col = z.column(j);
            assert!(col.mean().abs() < 1e-12);
            assert!((col.variance() - 1.0).abs() < 1e-12);
        }
        // Constant column is centered only.
        assert!(z.column(2).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn standard_scaler_requires_fit() {
        let (x, _) = data();
        assert!(matches!(
            StandardScaler::new().transform(&x),
            Err(Error::NotFitted(_))
        ));
    }

    #[test]
    fn min_max_scaler_maps_to_unit_interval() {
        let (x, y) = data();
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&x, &y).unwrap();
        let z = scaler.transform(&x).unwrap();
        assert!(z.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!((z[(3, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn transform_checks_width() {
        let (x, y) = data();
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&x, &y).unwrap();
        let narrow = x.columns(0, 2).into_owned();
        assert!(matches!(
            scaler.transform(&narrow),
            Err(Error::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn select_k_best_keeps_most_correlated() {
        let (x, y) = data();
        let mut select = SelectKBest::new(1);
        select.fit(&x, &y).unwrap();
        assert_eq!(select.selected(), Some(&[0][..]));
        assert_eq!(select.transform(&x).unwrap().ncols(), 1);
    }

    #[test]
    fn select_k_best_rejects_too_many() {
        let (x, y) = data();
        assert!(matches!(
            SelectKBest::new(4).fit(&x, &y),
            Err(Error::FitFailed { .. })
        ));
    }
}
