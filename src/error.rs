#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds for '{name}': low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The name of the offending hyperparameter.
        name: String,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds for '{0}': low must be positive for log scale")]
    InvalidLogBounds(String),

    /// Returned when step size is not positive.
    #[error("invalid step for '{0}': step must be positive")]
    InvalidStep(String),

    /// Returned when categorical choices are empty.
    #[error("categorical choices for '{0}' cannot be empty")]
    EmptyChoices(String),

    /// Returned when two hyperparameters share a name.
    #[error("hyperparameter '{0}' is declared more than once")]
    DuplicateParameter(String),

    /// Returned when a name does not refer to a declared hyperparameter.
    #[error("unknown hyperparameter '{0}'")]
    UnknownParameter(String),

    /// Returned when the search space schema is malformed in a way not
    /// covered by a more specific variant (e.g. a condition on a parameter
    /// declared later).
    #[error("invalid search space: {0}")]
    InvalidSearchSpace(String),

    /// Returned when a configuration does not satisfy its search space.
    #[error("invalid configuration for '{name}': {reason}")]
    InvalidConfiguration {
        /// The name of the offending hyperparameter.
        name: String,
        /// Why the assignment was rejected.
        reason: String,
    },

    /// Returned when a fold count below two is requested.
    #[error("invalid fold count: {0} (need at least 2)")]
    InvalidFoldCount(usize),

    /// Returned when more folds are requested than there are samples.
    #[error("cannot split {n_samples} samples into {n_splits} folds")]
    InsufficientSamples {
        /// Number of requested folds.
        n_splits: usize,
        /// Number of available samples.
        n_samples: usize,
    },

    /// Returned when a holdout fraction leaves one side empty.
    #[error("invalid holdout fraction {fraction} for {n_samples} samples")]
    InvalidHoldoutFraction {
        /// The requested validation fraction.
        fraction: f64,
        /// Number of available samples.
        n_samples: usize,
    },

    /// Returned when a supplied fold references rows outside the dataset,
    /// overlaps itself, or has an empty side.
    #[error("invalid fold {index}: {reason}")]
    InvalidFold {
        /// Position of the offending fold.
        index: usize,
        /// A human-readable description of the problem.
        reason: String,
    },

    /// Returned when matrix/vector shapes do not line up.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// The expected size.
        expected: usize,
        /// The actual size.
        got: usize,
    },

    /// Returned when a dataset has no rows or no columns.
    #[error("dataset must contain at least one row and one feature")]
    EmptyDataset,

    /// Returned when a pipeline stage fails to fit (singular system,
    /// degenerate data, non-convergence).
    #[error("fit failed in stage '{stage}': {reason}")]
    FitFailed {
        /// The name of the failing stage.
        stage: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// Returned when a pipeline or stage is used before `fit`.
    #[error("'{0}' used before fit")]
    NotFitted(String),

    /// Returned when a registry has no constructor for a stage tag.
    #[error("no stage registered under tag '{0}'")]
    UnknownStage(String),

    /// Returned when requesting the best trial but no trials have completed.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// Returned when a builder is missing a required component.
    #[error("missing required component: {0}")]
    MissingComponent(&'static str),

    /// Returned when gamma is not in the valid range (0.0, 1.0).
    #[error("invalid gamma: {0} must be in (0.0, 1.0)")]
    InvalidGamma(f64),

    /// Returned when bandwidth is not positive.
    #[error("invalid bandwidth: {0} must be positive")]
    InvalidBandwidth(f64),

    /// Returned when KDE is created with empty samples.
    #[error("KDE requires at least one sample")]
    EmptySamples,

    /// Returned when an async task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;

/// Why a trial ended in the [`Failed`](crate::TrialState::Failed) state.
///
/// Failure causes are recorded on the [`TrialRecord`](crate::TrialRecord)
/// instead of being raised: a failed trial never stops a study.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureCause {
    /// The proposed configuration did not satisfy the search space.
    InvalidConfiguration(String),
    /// Every fold of the evaluation failed.
    AllFoldsFailed {
        /// How many fold fits were attempted (and failed).
        n_folds: usize,
        /// The last fold error message.
        reason: String,
    },
    /// The evaluation exceeded the caller-supplied time budget.
    Timeout,
    /// The objective returned an error of its own.
    Objective(String),
}

impl FailureCause {
    /// Number of failed folds behind this cause; 0 unless every fold failed.
    #[must_use]
    pub fn n_failed_folds(&self) -> usize {
        match self {
            Self::AllFoldsFailed { n_folds, .. } => *n_folds,
            _ => 0,
        }
    }
}

impl core::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidConfiguration(reason) => write!(f, "invalid configuration: {reason}"),
            Self::AllFoldsFailed { n_folds, reason } => {
                write!(f, "all {n_folds} folds failed: {reason}")
            }
            Self::Timeout => write!(f, "time budget exceeded"),
            Self::Objective(reason) => write!(f, "objective failed: {reason}"),
        }
    }
}
