#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Hyperparameter optimization for preprocessing + model pipelines, scored
//! by nested resampling.
//!
//! A [`Study`] repeatedly asks a [`Sampler`](sampler::Sampler) for a
//! [`Configuration`] drawn from a [`SearchSpace`], scores it with an
//! [`Objective`], and records the outcome as a [`TrialRecord`]. The main
//! objective is [`NestedEvaluator`]: it builds a fresh
//! [`Pipeline`](pipeline::Pipeline) per fold, fits it on training rows only,
//! and averages inner cross-validated scores over a fixed outer partition of
//! the [`Dataset`].
//!
//! # Getting Started
//!
//! ```
//! use tuner::pipeline::{RegistryFactory, StageRegistry, Step, Task};
//! use tuner::prelude::*;
//!
//! // Two noisy blobs, labels 0 and 1.
//! let rows: Vec<Vec<f64>> = (0..60)
//!     .map(|i| {
//!         let c = if i % 2 == 0 { -1.0 } else { 1.0 };
//!         vec![c + f64::from(i % 7) * 0.05, c - f64::from(i % 5) * 0.05]
//!     })
//!     .collect();
//! let labels = (0..60).map(|i| f64::from(i % 2)).collect();
//! let data = Dataset::from_rows(&rows, labels).unwrap();
//!
//! let space = SearchSpace::builder()
//!     .log_float("alpha", 0.01, 10.0)
//!     .categorical("scaler", ["standard_scaler", "min_max_scaler"])
//!     .build()
//!     .unwrap();
//!
//! let factory = RegistryFactory::new(
//!     StageRegistry::with_defaults(Task::Classification),
//!     Step::fixed("ridge"),
//! )
//! .transformer("scale", Step::choice("scaler"));
//!
//! let evaluator = NestedEvaluator::builder()
//!     .dataset(data)
//!     .factory(factory)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let study = Study::builder()
//!     .maximize()
//!     .space(space)
//!     .sampler(TpeSampler::builder().seed(7).build().unwrap())
//!     .objective(evaluator)
//!     .build()
//!     .unwrap();
//!
//! study.run(10).unwrap();
//! assert!(study.best_value().unwrap() > 0.9);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`SearchSpace`] | Typed hyperparameters with conditional activation. |
//! | [`Configuration`] | An immutable name → value assignment. |
//! | [`Sampler`](sampler::Sampler) | Proposes configurations from the history (random, GP, TPE). |
//! | [`NestedEvaluator`] | Scores a configuration by nested resampling of a pipeline. |
//! | [`Study`] | Owns the history and drives proposal → evaluation → record. |
//! | [`TrialRecord`] | One evaluated configuration with its value and provenance. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | [`Study::run_parallel`] on tokio's blocking pool | off |
//! | `serde` | `Serialize`/`Deserialize` on public data types, [`Study::save`], [`StudySnapshot`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod configuration;
mod dataset;
pub mod distribution;
mod error;
pub mod evaluator;
mod kde;
pub mod objective;
mod param;
pub mod pipeline;
pub mod resample;
pub mod sampler;
pub mod space;
mod study;
mod trial;
mod types;

pub use configuration::Configuration;
pub use dataset::Dataset;
pub use error::{Error, FailureCause, Result};
pub use evaluator::{NestedEvaluator, NestedEvaluatorBuilder};
pub use objective::{Evaluation, Objective};
pub use param::ParamValue;
pub use resample::{Fold, Resampler};
pub use sampler::{
    GpSampler, GpSamplerBuilder, RandomSampler, Sampler, TpeSampler, TpeSamplerBuilder,
};
pub use space::{Condition, Hyperparameter, SearchSpace};
#[cfg(feature = "serde")]
pub use study::StudySnapshot;
pub use study::{PendingTrial, Study, StudyBuilder};
pub use trial::TrialRecord;
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use tuner::prelude::*;
/// ```
pub mod prelude {
    pub use crate::configuration::Configuration;
    pub use crate::dataset::Dataset;
    pub use crate::error::{Error, FailureCause, Result};
    pub use crate::evaluator::NestedEvaluator;
    pub use crate::objective::{Evaluation, Objective};
    pub use crate::param::ParamValue;
    pub use crate::resample::{Fold, Resampler};
    pub use crate::sampler::{GpSampler, RandomSampler, Sampler, TpeSampler};
    pub use crate::space::{Condition, Hyperparameter, SearchSpace};
    #[cfg(feature = "serde")]
    pub use crate::study::StudySnapshot;
    pub use crate::study::{Study, StudyBuilder};
    pub use crate::trial::TrialRecord;
    pub use crate::types::{Direction, TrialState};
}
