//! Preprocessing + estimator pipelines.
//!
//! A [`Pipeline`] is an ordered list of named [`Transformer`] stages followed
//! by a terminal [`Estimator`]. [`Pipeline::fit`] fits every stage on the
//! training rows only, feeding each stage's output to the next;
//! [`Pipeline::evaluate`] then only transforms and predicts, so no
//! statistic from the scored rows can leak into the fitted state.
//!
//! Pipelines are built per configuration by a [`PipelineFactory`], usually a
//! [`RegistryFactory`] over a [`StageRegistry`] of tagged constructors.
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use tuner::pipeline::{Pipeline, Ridge, StandardScaler};
//!
//! let x = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
//! let y = DVector::from_vec(vec![3.0, 5.0, 7.0, 9.0]);
//!
//! let mut pipeline = Pipeline::new("ridge", Ridge::regressor(1e-6))
//!     .with_stage("scale", StandardScaler::new());
//! pipeline.fit(&x, &y).unwrap();
//! assert!(pipeline.evaluate(&x, &y).unwrap() > 0.99);
//! ```

mod estimators;
mod metrics;
mod preprocess;
mod registry;

pub use estimators::{KNeighbors, Kernel, KernelRidge, Ridge};
pub use metrics::{Task, accuracy, r2_score};
pub use preprocess::{MinMaxScaler, Passthrough, SelectKBest, StandardScaler};
pub use registry::{PipelineFactory, RegistryFactory, StageRegistry, Step};

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// A preprocessing stage.
///
/// `fit` learns whatever statistics the stage needs from training rows;
/// `transform` applies them without learning.
pub trait Transformer: Send {
    /// Learns the stage's parameters from `x` (and `y`, for supervised
    /// selection).
    ///
    /// # Errors
    ///
    /// Returns an error when the data cannot support the stage.
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()>;

    /// Applies the fitted stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before `fit`, and
    /// [`Error::DimensionMismatch`] when `x` has a different width than the
    /// training data.
    fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>>;
}

/// A terminal model that predicts labels.
pub trait Estimator: Send {
    /// Fits the model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FitFailed`] for singular or degenerate problems.
    fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()>;

    /// Predicts one label per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before `fit`.
    fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>>;

    /// Whether predictions are class labels or real values; selects the
    /// score.
    fn task(&self) -> Task;
}

/// Ordered transformer stages plus a terminal estimator.
pub struct Pipeline {
    stages: Vec<(String, Box<dyn Transformer>)>,
    estimator_name: String,
    estimator: Box<dyn Estimator>,
    fitted: bool,
}

impl Pipeline {
    /// Creates a pipeline with no preprocessing.
    #[must_use]
    pub fn new(estimator_name: impl Into<String>, estimator: impl Estimator + 'static) -> Self {
        Self::from_boxed(estimator_name, Box::new(estimator))
    }

    /// Creates a pipeline from an already boxed estimator.
    #[must_use]
    pub fn from_boxed(estimator_name: impl Into<String>, estimator: Box<dyn Estimator>) -> Self {
        Self {
            stages: Vec::new(),
            estimator_name: estimator_name.into(),
            estimator,
            fitted: false,
        }
    }

    /// Appends a transformer stage (stages run in insertion order).
    #[must_use]
    pub fn with_stage(self, name: impl Into<String>, stage: impl Transformer + 'static) -> Self {
        self.with_boxed_stage(name, Box::new(stage))
    }

    /// Appends an already boxed transformer stage.
    #[must_use]
    pub fn with_boxed_stage(mut self, name: impl Into<String>, stage: Box<dyn Transformer>) -> Self {
        self.stages.push((name.into(), stage));
        self.fitted = false;
        self
    }

    /// Stage names in execution order, estimator last.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(core::iter::once(self.estimator_name.as_str()))
            .collect()
    }

    #[must_use]
    pub fn task(&self) -> Task {
        self.estimator.task()
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Fits every stage on `x`/`y`, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first stage error. A failed fit leaves the pipeline
    /// unfitted.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        self.fitted = false;
        if x.nrows() != y.len() {
            return Err(Error::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        let mut current = x.clone();
        for (_, stage) in &mut self.stages {
            stage.fit(&current, y)?;
            current = stage.transform(&current)?;
        }
        self.estimator.fit(&current, y)?;
        self.fitted = true;
        Ok(())
    }

    /// Predicts labels for `x` with the fitted stages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before a successful [`fit`](Self::fit).
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        if !self.fitted {
            return Err(Error::NotFitted(self.estimator_name.clone()));
        }
        let mut current = x.clone();
        for (_, stage) in &self.stages {
            current = stage.transform(&current)?;
        }
        self.estimator.predict(&current)
    }

    /// Scores the fitted pipeline on `x`/`y` (accuracy or R²).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before a successful [`fit`](Self::fit).
    pub fn evaluate(&self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        Ok(self.task().score(y, &predictions))
    }
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("fitted", &self.fitted)
            .finish()
    }
}

/// Checks that a transform input has the width seen during `fit`.
pub(crate) fn check_width(expected: usize, x: &DMatrix<f64>) -> Result<()> {
    if x.ncols() == expected {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected,
            got: x.ncols(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (DMatrix<f64>, DVector<f64>) {
        let x = DMatrix::from_fn(20, 1, |i, _| f64::from(u32::try_from(i).unwrap()));
        let y = x.column(0).map(|v| 2.0 * v + 1.0);
        (x, y)
    }

    #[test]
    fn evaluate_before_fit_is_an_error() {
        let (x, y) = line();
        let pipeline = Pipeline::new("ridge", Ridge::regressor(1.0));
        assert!(matches!(pipeline.evaluate(&x, &y), Err(Error::NotFitted(_))));
    }

    #[test]
    fn fit_then_score() {
        let (x, y) = line();
        let mut pipeline =
            Pipeline::new("ridge", Ridge::regressor(1e-8)).with_stage("scale", MinMaxScaler::new());
        pipeline.fit(&x, &y).unwrap();
        assert!(pipeline.is_fitted());
        assert!(pipeline.evaluate(&x, &y).unwrap() > 0.999);
        assert_eq!(pipeline.stage_names(), vec!["scale", "ridge"]);
    }

    #[test]
    fn failed_fit_leaves_pipeline_unfitted() {
        let (x, y) = line();
        let mut pipeline = Pipeline::new("ridge", Ridge::regressor(1.0))
            .with_stage("select", SelectKBest::new(5));
        assert!(pipeline.fit(&x, &y).is_err());
        assert!(!pipeline.is_fitted());
    }
}
