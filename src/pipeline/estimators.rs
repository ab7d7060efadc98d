//! Reference estimators.
//!
//! Ridge and kernel ridge solve their normal equations with a Cholesky
//! factorization; a system that is not positive definite is reported as
//! [`Error::FitFailed`]. As classifiers they regress one ±1 target column
//! per class (one-vs-rest) and predict the class with the largest output.

use nalgebra::{DMatrix, DVector, RowDVector};

use super::metrics::Task;
use super::{Estimator, check_width};
use crate::error::{Error, Result};

/// Target encoding shared by the ridge-family estimators.
#[derive(Clone, Debug)]
enum Targets {
    Regression,
    /// Sorted distinct class labels; column `c` of the target matrix is +1
    /// where the label equals `classes[c]` and -1 elsewhere.
    Classes(Vec<f64>),
}

impl Targets {
    fn encode(task: Task, y: &DVector<f64>) -> (Self, DMatrix<f64>) {
        match task {
            Task::Regression => (Self::Regression, DMatrix::from_column_slice(y.len(), 1, y.as_slice())),
            Task::Classification => {
                let classes = distinct_sorted(y.as_slice());
                #[allow(clippy::float_cmp)]
                let coded = DMatrix::from_fn(y.len(), classes.len(), |i, c| {
                    if y[i] == classes[c] { 1.0 } else { -1.0 }
                });
                (Self::Classes(classes), coded)
            }
        }
    }

    fn decode(&self, outputs: &DMatrix<f64>) -> DVector<f64> {
        match self {
            Self::Regression => outputs.column(0).into_owned(),
            Self::Classes(classes) => DVector::from_fn(outputs.nrows(), |i, _| {
                let row = outputs.row(i);
                let best = (0..row.len())
                    .max_by(|&a, &b| row[a].total_cmp(&row[b]).then(b.cmp(&a)))
                    .unwrap_or(0);
                classes[best]
            }),
        }
    }
}

fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut classes = values.to_vec();
    classes.sort_by(f64::total_cmp);
    classes.dedup_by(|a, b| a.total_cmp(b).is_eq());
    classes
}

fn check_fit_input(stage: &str, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(Error::EmptyDataset);
    }
    if x.nrows() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.nrows(),
            got: y.len(),
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(Error::FitFailed {
            stage: stage.into(),
            reason: "non-finite input".into(),
        });
    }
    Ok(())
}

fn singular(stage: &str) -> Error {
    Error::FitFailed {
        stage: stage.into(),
        reason: "system is not positive definite".into(),
    }
}

/// Linear least squares with an L2 penalty `alpha` on the weights (not the
/// intercept).
#[derive(Clone, Debug)]
pub struct Ridge {
    alpha: f64,
    task: Task,
    fitted: Option<RidgeFit>,
}

#[derive(Clone, Debug)]
struct RidgeFit {
    weights: DMatrix<f64>,
    intercept: RowDVector<f64>,
    targets: Targets,
}

impl Ridge {
    #[must_use]
    pub fn regressor(alpha: f64) -> Self {
        Self::new(alpha, Task::Regression)
    }

    #[must_use]
    pub fn classifier(alpha: f64) -> Self {
        Self::new(alpha, Task::Classification)
    }

    #[must_use]
    pub fn new(alpha: f64, task: Task) -> Self {
        Self {
            alpha,
            task,
            fitted: None,
        }
    }

    /// Fitted weight matrix (features × outputs).
    #[must_use]
    pub fn weights(&self) -> Option<&DMatrix<f64>> {
        self.fitted.as_ref().map(|f| &f.weights)
    }
}

impl Estimator for Ridge {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input("Ridge", x, y)?;
        if !(self.alpha >= 0.0 && self.alpha.is_finite()) {
            return Err(Error::FitFailed {
                stage: "Ridge".into(),
                reason: format!("alpha must be a non-negative number, got {}", self.alpha),
            });
        }

        let (targets, t) = Targets::encode(self.task, y);
        let x_mean = x.row_mean();
        let t_mean = t.row_mean();
        let xc = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - x_mean[j]);
        let tc = DMatrix::from_fn(t.nrows(), t.ncols(), |i, c| t[(i, c)] - t_mean[c]);

        let mut gram = xc.transpose() * &xc;
        for j in 0..gram.nrows() {
            gram[(j, j)] += self.alpha;
        }
        let cholesky = gram.cholesky().ok_or_else(|| singular("Ridge"))?;
        let weights = cholesky.solve(&(xc.transpose() * &tc));
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(singular("Ridge"));
        }
        let intercept = &t_mean - &x_mean * &weights;

        self.fitted = Some(RidgeFit {
            weights,
            intercept,
            targets,
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let fit = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::NotFitted("Ridge".into()))?;
        check_width(fit.weights.nrows(), x)?;
        let mut outputs = x * &fit.weights;
        for mut row in outputs.row_iter_mut() {
            row += &fit.intercept;
        }
        Ok(fit.targets.decode(&outputs))
    }

    fn task(&self) -> Task {
        self.task
    }
}

/// Kernel functions for [`KernelRidge`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kernel {
    /// `x·z`
    Linear,
    /// `(gamma x·z + coef0)^degree`
    Poly {
        /// Polynomial degree.
        degree: u32,
        /// Scale applied to the dot product.
        gamma: f64,
        /// Constant term.
        coef0: f64,
    },
    /// `exp(-gamma ||x - z||²)`
    Rbf {
        /// Inverse length scale; larger values give narrower bumps.
        gamma: f64,
    },
}

impl Kernel {
    fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Self::Linear => dot(a, b),
            Self::Poly {
                degree,
                gamma,
                coef0,
            } => (gamma * dot(a, b) + coef0).powi(i32::try_from(degree).unwrap_or(i32::MAX)),
            Self::Rbf { gamma } => {
                let sq: f64 = a.iter().zip(b).map(|(x, z)| (x - z).powi(2)).sum();
                (-gamma * sq).exp()
            }
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, z)| x * z).sum()
}

fn rows_of(x: &DMatrix<f64>) -> Vec<Vec<f64>> {
    x.row_iter().map(|r| r.iter().copied().collect()).collect()
}

/// Kernel ridge regression: solves `(K + alpha I) A = T` in the dual.
///
/// Targets are centered before the solve and the mean added back on
/// prediction.
#[derive(Clone, Debug)]
pub struct KernelRidge {
    alpha: f64,
    kernel: Kernel,
    task: Task,
    fitted: Option<KernelRidgeFit>,
}

#[derive(Clone, Debug)]
struct KernelRidgeFit {
    support: Vec<Vec<f64>>,
    dual: DMatrix<f64>,
    offset: RowDVector<f64>,
    targets: Targets,
}

impl KernelRidge {
    #[must_use]
    pub fn new(alpha: f64, kernel: Kernel, task: Task) -> Self {
        Self {
            alpha,
            kernel,
            task,
            fitted: None,
        }
    }

    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }
}

impl Estimator for KernelRidge {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input("KernelRidge", x, y)?;
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(Error::FitFailed {
                stage: "KernelRidge".into(),
                reason: format!("alpha must be positive, got {}", self.alpha),
            });
        }

        let (targets, t) = Targets::encode(self.task, y);
        let offset = t.row_mean();
        let tc = DMatrix::from_fn(t.nrows(), t.ncols(), |i, c| t[(i, c)] - offset[c]);

        let support = rows_of(x);
        let n = support.len();
        let gram = DMatrix::from_fn(n, n, |i, j| {
            let k = self.kernel.eval(&support[i], &support[j]);
            if i == j { k + self.alpha } else { k }
        });
        if gram.iter().any(|v| !v.is_finite()) {
            return Err(singular("KernelRidge"));
        }
        let cholesky = gram.cholesky().ok_or_else(|| singular("KernelRidge"))?;
        let dual = cholesky.solve(&tc);
        if dual.iter().any(|a| !a.is_finite()) {
            return Err(singular("KernelRidge"));
        }

        self.fitted = Some(KernelRidgeFit {
            support,
            dual,
            offset,
            targets,
        });
        Ok(())
    }

    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let fit = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::NotFitted("KernelRidge".into()))?;
        check_width(fit.support.first().map_or(0, Vec::len), x)?;
        let rows = rows_of(x);
        let cross = DMatrix::from_fn(rows.len(), fit.support.len(), |i, j| {
            self.kernel.eval(&rows[i], &fit.support[j])
        });
        let mut outputs = cross * &fit.dual;
        for mut row in outputs.row_iter_mut() {
            row += &fit.offset;
        }
        Ok(fit.targets.decode(&outputs))
    }

    fn task(&self) -> Task {
        self.task
    }
}

/// k-nearest neighbours under Euclidean distance.
///
/// Classification takes the majority label among the neighbours (ties go
/// to the smaller label); regression averages them. Equidistant neighbours
/// are ordered by training row.
#[derive(Clone, Debug)]
pub struct KNeighbors {
    n_neighbors: usize,
    task: Task,
    train: Option<(Vec<Vec<f64>>, Vec<f64>)>,
}

impl KNeighbors {
    #[must_use]
    pub fn new(n_neighbors: usize, task: Task) -> Self {
        Self {
            n_neighbors,
            task,
            train: None,
        }
    }
}

impl Estimator for KNeighbors {
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        self.train = None;
        check_fit_input("KNeighbors", x, y)?;
        if self.n_neighbors == 0 || self.n_neighbors > x.nrows() {
            return Err(Error::FitFailed {
                stage: "KNeighbors".into(),
                reason: format!(
                    "n_neighbors = {} must be in 1..={}",
                    self.n_neighbors,
                    x.nrows()
                ),
            });
        }
        self.train = Some((rows_of(x), y.iter().copied().collect()));
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let (points, labels) = self
            .train
            .as_ref()
            .ok_or_else(|| Error::NotFitted("KNeighbors".into()))?;
        check_width(points.first().map_or(0, Vec::len), x)?;

        let queries = rows_of(x);
        let predictions = queries.iter().map(|query| {
            let mut by_distance: Vec<(f64, usize)> = points
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let d: f64 = p.iter().zip(query).map(|(a, b)| (a - b).powi(2)).sum();
                    (d, i)
                })
                .collect();
            by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let neighbours: Vec<f64> = by_distance[..self.n_neighbors]
                .iter()
                .map(|&(_, i)| labels[i])
                .collect();

            match self.task {
                Task::Regression => neighbours.iter().sum::<f64>() / neighbours.len() as f64,
                Task::Classification => majority(&neighbours),
            }
        });
        Ok(DVector::from_iterator(x.nrows(), predictions))
    }

    fn task(&self) -> Task {
        self.task
    }
}

/// Most frequent label; the smallest label wins ties.
fn majority(labels: &[f64]) -> f64 {
    let sorted = distinct_sorted(labels);
    let count = |c: f64| labels.iter().filter(|l| l.total_cmp(&c).is_eq()).count();
    let mut best = (0usize, f64::NAN);
    for class in sorted {
        let n = count(class);
        if n > best.0 {
            best = (n, class);
        }
    }
    best.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::metrics::{accuracy, r2_score};

    fn blobs() -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_row_slice(
            8,
            2,
            &[
                -1.5, -1.4, -1.3, -1.5, -1.4, -1.2, -1.2, -1.3, //
                1.5, 1.6, 1.7, 1.4, 1.3, 1.5, 1.6, 1.8,
            ],
        );
        let y = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn ridge_recovers_linear_relation() {
        let x = DMatrix::from_fn(10, 2, |i, j| {
            let v = if j == 0 { i } else { (i * i) % 7 };
            f64::from(u32::try_from(v).unwrap())
        });
        let y = DVector::from_fn(10, |i, _| 3.0 * x[(i, 0)] - 2.0 * x[(i, 1)] + 0.5);
        let mut ridge = Ridge::regressor(1e-9);
        ridge.fit(&x, &y).unwrap();
        let pred = ridge.predict(&x).unwrap();
        assert!(r2_score(&y, &pred) > 0.999_999);
    }

    #[test]
    fn ridge_classifier_separates_blobs() {
        let (x, y) = blobs();
        let mut ridge = Ridge::classifier(0.1);
        ridge.fit(&x, &y).unwrap();
        assert!((accuracy(&y, &ridge.predict(&x).unwrap()) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ridge_without_penalty_on_constant_feature_fails() {
        let x = DMatrix::from_element(5, 1, 3.0);
        let y = DVector::from_fn(5, |i, _| f64::from(u32::try_from(i).unwrap()));
        let mut ridge = Ridge::regressor(0.0);
        assert!(matches!(ridge.fit(&x, &y), Err(Error::FitFailed { .. })));
        assert!(matches!(ridge.predict(&x), Err(Error::NotFitted(_))));
    }

    #[test]
    fn kernel_ridge_kernels_fit_blobs() {
        let (x, y) = blobs();
        for kernel in [
            Kernel::Linear,
            Kernel::Poly {
                degree: 2,
                gamma: 1.0,
                coef0: 1.0,
            },
            Kernel::Rbf { gamma: 0.5 },
        ] {
            let mut model = KernelRidge::new(0.1, kernel, Task::Classification);
            model.fit(&x, &y).unwrap();
            let acc = accuracy(&y, &model.predict(&x).unwrap());
            assert!((acc - 1.0).abs() < f64::EPSILON, "{kernel:?}: {acc}");
        }
    }

    #[test]
    fn kernel_parameters_shape_the_similarity() {
        let poly = Kernel::Poly { degree: 3, gamma: 0.5, coef0: 1.0 };
        assert!((poly.eval(&[2.0, 0.0], &[1.0, 4.0]) - 8.0).abs() < 1e-12);

        let (a, b) = ([0.0, 0.0], [1.0, 1.0]);
        let wide = Kernel::Rbf { gamma: 0.1 }.eval(&a, &b);
        let narrow = Kernel::Rbf { gamma: 2.0 }.eval(&a, &b);
        assert!(narrow < wide);
        assert!((Kernel::Rbf { gamma: 2.0 }.eval(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kernel_ridge_rejects_zero_alpha() {
        let (x, y) = blobs();
        let mut model = KernelRidge::new(0.0, Kernel::Linear, Task::Regression);
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn knn_votes_and_averages() {
        let (x, y) = blobs();
        let mut clf = KNeighbors::new(3, Task::Classification);
        clf.fit(&x, &y).unwrap();
        let query = DMatrix::from_row_slice(2, 2, &[-1.45, -1.45, 1.55, 1.5]);
        assert_eq!(clf.predict(&query).unwrap().as_slice(), &[0.0, 1.0]);

        let mut reg = KNeighbors::new(8, Task::Regression);
        reg.fit(&x, &y).unwrap();
        let mean = reg.predict(&query).unwrap();
        assert!((mean[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn knn_rejects_too_many_neighbours() {
        let (x, y) = blobs();
        assert!(KNeighbors::new(9, Task::Classification).fit(&x, &y).is_err());
    }

    #[test]
    fn majority_breaks_ties_low() {
        assert!((majority(&[1.0, 0.0, 1.0, 0.0]) - 0.0).abs() < f64::EPSILON);
        assert!((majority(&[2.0, 1.0, 2.0]) - 2.0).abs() < f64::EPSILON);
    }
}
