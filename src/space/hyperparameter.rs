use crate::distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
use crate::error::{Error, Result};

use super::Condition;

/// Sampling scale of a numeric hyperparameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scale {
    /// Uniform density over `[low, high]`.
    #[default]
    Linear,
    /// Uniform density over `[ln low, ln high]`.
    Log,
}

/// The set of values a hyperparameter may take.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Domain {
    /// A continuous range.
    Float {
        /// Lower bound (inclusive).
        low: f64,
        /// Upper bound (inclusive).
        high: f64,
        /// Sampling scale.
        scale: Scale,
        /// Optional discretization step.
        step: Option<f64>,
    },
    /// An integer range.
    Int {
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
        /// Sampling scale.
        scale: Scale,
        /// Optional discretization step.
        step: Option<i64>,
    },
    /// A finite set of labelled choices.
    Categorical {
        /// The labels, in index order.
        choices: Vec<String>,
    },
}

/// A declared, named hyperparameter with an optional activation rule.
///
/// # Examples
///
/// ```
/// use tuner::space::{Condition, Hyperparameter};
///
/// let c = Hyperparameter::float("C", 0.1, 10.0).log_scale();
/// let kernel = Hyperparameter::categorical("kernel", ["linear", "poly", "rbf"]);
/// let degree = Hyperparameter::int("degree", 2, 5).active_when(Condition::equals("kernel", "poly"));
///
/// assert!(c.condition().is_none());
/// assert_eq!(degree.condition().unwrap().parents(), vec!["kernel"]);
/// assert_eq!(kernel.choices().unwrap().len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperparameter {
    name: String,
    domain: Domain,
    condition: Option<Condition>,
}

impl Hyperparameter {
    /// Declares a linear-scale float hyperparameter on `[low, high]`.
    #[must_use]
    pub fn float(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Float {
                low,
                high,
                scale: Scale::Linear,
                step: None,
            },
            condition: None,
        }
    }

    /// Declares a linear-scale integer hyperparameter on `[low, high]`.
    #[must_use]
    pub fn int(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Int {
                low,
                high,
                scale: Scale::Linear,
                step: None,
            },
            condition: None,
        }
    }

    /// Declares a categorical hyperparameter over the given labels.
    #[must_use]
    pub fn categorical<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            domain: Domain::Categorical {
                choices: choices.into_iter().map(Into::into).collect(),
            },
            condition: None,
        }
    }

    /// Switches a numeric hyperparameter to log-scale sampling.
    ///
    /// Has no effect on categorical hyperparameters.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        match &mut self.domain {
            Domain::Float { scale, .. } | Domain::Int { scale, .. } => *scale = Scale::Log,
            Domain::Categorical { .. } => {}
        }
        self
    }

    /// Sets a discretization step on a float hyperparameter.
    #[must_use]
    pub fn step(mut self, value: f64) -> Self {
        if let Domain::Float { step, .. } = &mut self.domain {
            *step = Some(value);
        }
        self
    }

    /// Sets a discretization step on an integer hyperparameter.
    #[must_use]
    pub fn int_step(mut self, value: i64) -> Self {
        if let Domain::Int { step, .. } = &mut self.domain {
            *step = Some(value);
        }
        self
    }

    /// Declares when this hyperparameter is active.
    ///
    /// Without a condition the hyperparameter is always active.
    #[must_use]
    pub fn active_when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Returns the hyperparameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared domain.
    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the activation rule, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// Returns the categorical labels, or `None` for numeric hyperparameters.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        match &self.domain {
            Domain::Categorical { choices } => Some(choices),
            _ => None,
        }
    }

    /// Returns the index of `label` among the categorical choices.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.choices()?.iter().position(|c| c == label)
    }

    /// Returns the sampler-facing distribution for this hyperparameter.
    #[must_use]
    pub fn distribution(&self) -> Distribution {
        match &self.domain {
            Domain::Float {
                low,
                high,
                scale,
                step,
            } => Distribution::Float(FloatDistribution {
                low: *low,
                high: *high,
                log_scale: *scale == Scale::Log,
                step: *step,
            }),
            Domain::Int {
                low,
                high,
                scale,
                step,
            } => Distribution::Int(IntDistribution {
                low: *low,
                high: *high,
                log_scale: *scale == Scale::Log,
                step: *step,
            }),
            Domain::Categorical { choices } => {
                Distribution::Categorical(CategoricalDistribution {
                    n_choices: choices.len(),
                })
            }
        }
    }

    /// Checks the declared domain on its own (bounds, steps, choices).
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn validate_domain(&self) -> Result<()> {
        let name = &self.name;
        match &self.domain {
            Domain::Float {
                low,
                high,
                scale,
                step,
            } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(Error::InvalidBounds {
                        name: name.clone(),
                        low: *low,
                        high: *high,
                    });
                }
                if *scale == Scale::Log && *low <= 0.0 {
                    return Err(Error::InvalidLogBounds(name.clone()));
                }
                if let Some(step) = step
                    && (*step <= 0.0 || !step.is_finite())
                {
                    return Err(Error::InvalidStep(name.clone()));
                }
            }
            Domain::Int {
                low,
                high,
                scale,
                step,
            } => {
                if low > high {
                    return Err(Error::InvalidBounds {
                        name: name.clone(),
                        low: *low as f64,
                        high: *high as f64,
                    });
                }
                if *scale == Scale::Log && *low < 1 {
                    return Err(Error::InvalidLogBounds(name.clone()));
                }
                if let Some(step) = step
                    && *step <= 0
                {
                    return Err(Error::InvalidStep(name.clone()));
                }
            }
            Domain::Categorical { choices } => {
                if choices.is_empty() {
                    return Err(Error::EmptyChoices(name.clone()));
                }
                for (i, label) in choices.iter().enumerate() {
                    if choices[..i].contains(label) {
                        return Err(Error::InvalidSearchSpace(format!(
                            "duplicate choice '{label}' in '{name}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
