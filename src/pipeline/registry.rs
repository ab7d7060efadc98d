//! Building pipelines from configurations.
//!
//! A [`StageRegistry`] maps string tags to constructors. A
//! [`RegistryFactory`] lists the pipeline's steps; each step is either a
//! fixed tag or a categorical hyperparameter whose chosen label is the tag.
//! Tags are only ever looked up, never interpreted.
//!
//! ```
//! use tuner::pipeline::{PipelineFactory, RegistryFactory, StageRegistry, Step, Task};
//! use tuner::prelude::*;
//!
//! let space = SearchSpace::builder()
//!     .categorical("model", ["ridge", "knn"])
//!     .log_float("alpha", 0.01, 10.0)
//!     .build()
//!     .unwrap();
//! let config = space
//!     .configuration()
//!     .choice("model", "ridge")
//!     .float("alpha", 1.0)
//!     .build()
//!     .unwrap();
//!
//! let factory = RegistryFactory::new(StageRegistry::with_defaults(Task::Classification), Step::choice("model"))
//!     .transformer("scale", Step::fixed("standard_scaler"));
//! let pipeline = factory.build(&config).unwrap();
//! assert_eq!(pipeline.stage_names(), vec!["scale", "model"]);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use super::estimators::{KNeighbors, Kernel, KernelRidge, Ridge};
use super::metrics::Task;
use super::preprocess::{MinMaxScaler, Passthrough, SelectKBest, StandardScaler};
use super::{Estimator, Pipeline, Transformer};
use crate::configuration::Configuration;
use crate::error::{Error, Result};

/// Builds a fresh, unfitted [`Pipeline`] for a configuration.
///
/// Implemented by [`RegistryFactory`] and by any
/// `Fn(&Configuration) -> Result<Pipeline> + Send + Sync` closure.
pub trait PipelineFactory: Send + Sync {
    /// Builds a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration does not describe a
    /// buildable pipeline (unknown stage tag, missing hyperparameter).
    fn build(&self, config: &Configuration) -> Result<Pipeline>;
}

impl<F> PipelineFactory for F
where
    F: Fn(&Configuration) -> Result<Pipeline> + Send + Sync,
{
    fn build(&self, config: &Configuration) -> Result<Pipeline> {
        self(config)
    }
}

type TransformerCtor = Box<dyn Fn(&Configuration) -> Result<Box<dyn Transformer>> + Send + Sync>;
type EstimatorCtor = Box<dyn Fn(&Configuration) -> Result<Box<dyn Estimator>> + Send + Sync>;

/// Tag → constructor tables for transformers and estimators.
#[derive(Default)]
pub struct StageRegistry {
    transformers: HashMap<String, TransformerCtor>,
    estimators: HashMap<String, EstimatorCtor>,
}

/// Optional float hyperparameter with a fallback.
fn float_or(config: &Configuration, name: &str, default: f64) -> f64 {
    config.float(name).unwrap_or(default)
}

fn usize_param(config: &Configuration, name: &str, default: usize) -> Result<usize> {
    match config.int(name) {
        None => Ok(default),
        Some(v) => usize::try_from(v).map_err(|_| Error::InvalidConfiguration {
            name: name.into(),
            reason: format!("{v} is negative"),
        }),
    }
}

/// Reads the `kernel` choice and its dependent hyperparameters.
fn kernel_from(config: &Configuration) -> Result<Kernel> {
    match config.choice("kernel").unwrap_or("rbf") {
        "linear" => Ok(Kernel::Linear),
        "poly" => Ok(Kernel::Poly {
            degree: u32::try_from(config.int("degree").unwrap_or(3)).map_err(|_| {
                Error::InvalidConfiguration {
                    name: "degree".into(),
                    reason: "must be a non-negative 32-bit integer".into(),
                }
            })?,
            gamma: float_or(config, "gamma", 1.0),
            coef0: float_or(config, "coef0", 1.0),
        }),
        "rbf" => Ok(Kernel::Rbf {
            gamma: float_or(config, "gamma", 1.0),
        }),
        other => Err(Error::UnknownStage(format!("kernel '{other}'"))),
    }
}

impl StageRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the reference stages.
    ///
    /// | Tag | Stage | Hyperparameters read |
    /// |-----|-------|----------------------|
    /// | `standard_scaler` | [`StandardScaler`] | |
    /// | `min_max_scaler` | [`MinMaxScaler`] | |
    /// | `select_k_best` | [`SelectKBest`] | `k_features` (default 1) |
    /// | `passthrough` | [`Passthrough`] | |
    /// | `ridge` | [`Ridge`] | `alpha` (default 1.0) |
    /// | `kernel_ridge` | [`KernelRidge`] | `alpha`, `kernel` (default `rbf`), `degree`, `gamma`, `coef0` |
    /// | `knn` | [`KNeighbors`] | `n_neighbors` (default 5) |
    ///
    /// Estimators are built for `task`.
    #[must_use]
    pub fn with_defaults(task: Task) -> Self {
        Self::new()
            .register_transformer("standard_scaler", |_| Ok(StandardScaler::new()))
            .register_transformer("min_max_scaler", |_| Ok(MinMaxScaler::new()))
            .register_transformer("select_k_best", |c| {
                Ok(SelectKBest::new(usize_param(c, "k_features", 1)?))
            })
            .register_transformer("passthrough", |_| Ok(Passthrough))
            .register_estimator("ridge", move |c| {
                Ok(Ridge::new(float_or(c, "alpha", 1.0), task))
            })
            .register_estimator("kernel_ridge", move |c| {
                Ok(KernelRidge::new(float_or(c, "alpha", 1.0), kernel_from(c)?, task))
            })
            .register_estimator("knn", move |c| {
                Ok(KNeighbors::new(usize_param(c, "n_neighbors", 5)?, task))
            })
    }

    /// Registers (or replaces) a transformer constructor under `tag`.
    #[must_use]
    pub fn register_transformer<T, F>(mut self, tag: impl Into<String>, ctor: F) -> Self
    where
        T: Transformer + 'static,
        F: Fn(&Configuration) -> Result<T> + Send + Sync + 'static,
    {
        self.transformers.insert(
            tag.into(),
            Box::new(move |c: &Configuration| {
                ctor(c).map(|t| Box::new(t) as Box<dyn Transformer>)
            }),
        );
        self
    }

    /// Registers (or replaces) an estimator constructor under `tag`.
    #[must_use]
    pub fn register_estimator<E, F>(mut self, tag: impl Into<String>, ctor: F) -> Self
    where
        E: Estimator + 'static,
        F: Fn(&Configuration) -> Result<E> + Send + Sync + 'static,
    {
        self.estimators.insert(
            tag.into(),
            Box::new(move |c: &Configuration| {
                ctor(c).map(|e| Box::new(e) as Box<dyn Estimator>)
            }),
        );
        self
    }

    /// Builds the transformer registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStage`] for an unregistered tag, or the
    /// constructor's error.
    pub fn transformer(&self, tag: &str, config: &Configuration) -> Result<Box<dyn Transformer>> {
        let ctor = self
            .transformers
            .get(tag)
            .ok_or_else(|| Error::UnknownStage(tag.to_owned()))?;
        ctor(config)
    }

    /// Builds the estimator registered under `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStage`] for an unregistered tag, or the
    /// constructor's error.
    pub fn estimator(&self, tag: &str, config: &Configuration) -> Result<Box<dyn Estimator>> {
        let ctor = self
            .estimators
            .get(tag)
            .ok_or_else(|| Error::UnknownStage(tag.to_owned()))?;
        ctor(config)
    }

    /// Returns `true` if any stage is registered under `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.transformers.contains_key(tag) || self.estimators.contains_key(tag)
    }
}

impl core::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut transformers: Vec<&String> = self.transformers.keys().collect();
        let mut estimators: Vec<&String> = self.estimators.keys().collect();
        transformers.sort();
        estimators.sort();
        f.debug_struct("StageRegistry")
            .field("transformers", &transformers)
            .field("estimators", &estimators)
            .finish()
    }
}

/// How a pipeline step picks its stage tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Always the same tag.
    Fixed(String),
    /// The label chosen for this categorical hyperparameter.
    Choice(String),
}

impl Step {
    #[must_use]
    pub fn fixed(tag: impl Into<String>) -> Self {
        Self::Fixed(tag.into())
    }

    #[must_use]
    pub fn choice(param: impl Into<String>) -> Self {
        Self::Choice(param.into())
    }

    /// Resolves the tag for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when a choice step's
    /// hyperparameter is not assigned.
    pub fn resolve<'a>(&'a self, config: &'a Configuration) -> Result<&'a str> {
        match self {
            Self::Fixed(tag) => Ok(tag.as_str()),
            Self::Choice(param) => config.choice(param).ok_or_else(|| Error::InvalidConfiguration {
                name: param.clone(),
                reason: "pipeline step has no chosen stage".into(),
            }),
        }
    }

    /// Stage name used inside the built pipeline.
    fn stage_name<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() {
            match self {
                Self::Fixed(tag) | Self::Choice(tag) => tag.as_str(),
            }
        } else {
            name
        }
    }
}

/// A [`PipelineFactory`] assembling pipelines from a [`StageRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryFactory {
    registry: Arc<StageRegistry>,
    transformers: Vec<(String, Step)>,
    estimator: Step,
}

impl RegistryFactory {
    /// A factory with only an estimator step. The estimator stage is named
    /// after the tag (fixed) or the hyperparameter (choice).
    #[must_use]
    pub fn new(registry: impl Into<Arc<StageRegistry>>, estimator: Step) -> Self {
        Self {
            registry: registry.into(),
            transformers: Vec::new(),
            estimator,
        }
    }

    /// Appends a transformer step named `name`.
    #[must_use]
    pub fn transformer(mut self, name: impl Into<String>, step: Step) -> Self {
        self.transformers.push((name.into(), step));
        self
    }

    #[must_use]
    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }
}

impl PipelineFactory for RegistryFactory {
    fn build(&self, config: &Configuration) -> Result<Pipeline> {
        let estimator = self
            .registry
            .estimator(self.estimator.resolve(config)?, config)?;
        let mut pipeline = Pipeline::from_boxed(self.estimator.stage_name(""), estimator);
        for (name, step) in &self.transformers {
            let stage = self.registry.transformer(step.resolve(config)?, config)?;
            pipeline = pipeline.with_boxed_stage(step.stage_name(name), stage);
        }
        Ok(pipeline)
    }
}
