use crate::configuration::Configuration;

/// An activation rule for a conditional hyperparameter.
///
/// A condition is evaluated against the values already assigned to its
/// parent hyperparameters. A parent that is itself inactive (absent from
/// the assignment) never satisfies a condition, so whole subtrees switch
/// off together.
///
/// # Examples
///
/// ```
/// use tuner::space::Condition;
///
/// let poly_only = Condition::equals("kernel", "poly");
/// let kernelized = Condition::one_of("kernel", ["poly", "rbf"]);
/// let deep = Condition::int_range("n_layers", 3, 8);
/// let both = Condition::all([kernelized, deep]);
/// assert_eq!(both.parents(), vec!["kernel", "n_layers"]);
/// # let _ = poly_only;
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// The categorical parent has the given label.
    Equals {
        /// Parent hyperparameter name.
        parent: String,
        /// Required label.
        value: String,
    },
    /// The categorical parent has one of the given labels.
    OneOf {
        /// Parent hyperparameter name.
        parent: String,
        /// Accepted labels.
        values: Vec<String>,
    },
    /// The integer parent lies in `[low, high]`.
    IntRange {
        /// Parent hyperparameter name.
        parent: String,
        /// Lower bound (inclusive).
        low: i64,
        /// Upper bound (inclusive).
        high: i64,
    },
    /// Every nested condition holds.
    All(Vec<Condition>),
    /// At least one nested condition holds.
    Any(Vec<Condition>),
}

impl Condition {
    /// Active when `parent` equals the label `value`.
    #[must_use]
    pub fn equals(parent: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            parent: parent.into(),
            value: value.into(),
        }
    }

    /// Active when `parent` takes any of `values`.
    #[must_use]
    pub fn one_of<I, S>(parent: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf {
            parent: parent.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Active when the integer `parent` lies in `[low, high]`.
    #[must_use]
    pub fn int_range(parent: impl Into<String>, low: i64, high: i64) -> Self {
        Self::IntRange {
            parent: parent.into(),
            low,
            high,
        }
    }

    /// Active when every condition holds.
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Active when any condition holds.
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Evaluates the condition against a (possibly partial) assignment.
    #[must_use]
    pub fn holds(&self, assigned: &Configuration) -> bool {
        match self {
            Self::Equals { parent, value } => assigned.choice(parent) == Some(value.as_str()),
            Self::OneOf { parent, values } => assigned
                .choice(parent)
                .is_some_and(|label| values.iter().any(|v| v == label)),
            Self::IntRange { parent, low, high } => assigned
                .int(parent)
                .is_some_and(|v| (*low..=*high).contains(&v)),
            Self::All(conditions) => conditions.iter().all(|c| c.holds(assigned)),
            Self::Any(conditions) => conditions.iter().any(|c| c.holds(assigned)),
        }
    }

    /// Returns the names of every parent referenced, in first-seen order.
    #[must_use]
    pub fn parents(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_parents(&mut out);
        out
    }

    fn collect_parents<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Equals { parent, .. }
            | Self::OneOf { parent, .. }
            | Self::IntRange { parent, .. } => {
                if !out.contains(&parent.as_str()) {
                    out.push(parent);
                }
            }
            Self::All(conditions) | Self::Any(conditions) => {
                for c in conditions {
                    c.collect_parents(out);
                }
            }
        }
    }
}
