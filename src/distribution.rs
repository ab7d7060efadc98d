//! Parameter distribution types.
//!
//! A [`Distribution`] is the sampler-facing view of a hyperparameter's
//! domain: bounds, scale, and step, with no name or activation rule.

/// Distribution for floating-point parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Whether to sample in log space.
    pub log_scale: bool,
    /// Optional step size for discretization.
    pub step: Option<f64>,
}

/// Distribution for integer parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntDistribution {
    /// Lower bound (inclusive).
    pub low: i64,
    /// Upper bound (inclusive).
    pub high: i64,
    /// Whether to sample in log space.
    pub log_scale: bool,
    /// Optional step size for discretization.
    pub step: Option<i64>,
}

/// Distribution for categorical parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoricalDistribution {
    /// Number of choices available.
    pub n_choices: usize,
}

/// Enum wrapping all parameter distribution types.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distribution {
    /// A floating-point distribution.
    Float(FloatDistribution),
    /// An integer distribution.
    Int(IntDistribution),
    /// A categorical distribution.
    Categorical(CategoricalDistribution),
}

impl Distribution {
    /// Returns `true` if `value` has the right kind and lies inside the
    /// bounds (and on the step grid, when a step is set).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, value: &crate::param::ParamValue) -> bool {
        use crate::param::ParamValue;

        match (self, value) {
            (Self::Float(d), ParamValue::Float(v)) => {
                if !v.is_finite() || *v < d.low || *v > d.high {
                    return false;
                }
                match d.step {
                    Some(step) => {
                        let k = ((v - d.low) / step).round();
                        (d.low + k * step - v).abs() <= 1e-9 * step.max(1.0)
                    }
                    None => true,
                }
            }
            (Self::Int(d), ParamValue::Int(v)) => {
                if *v < d.low || *v > d.high {
                    return false;
                }
                d.step
                    .is_none_or(|step| (i128::from(*v) - i128::from(d.low)) % i128::from(step) == 0)
            }
            (Self::Categorical(d), ParamValue::Categorical(i)) => *i < d.n_choices,
            _ => false,
        }
    }
}
