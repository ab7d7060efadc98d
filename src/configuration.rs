//! Immutable hyperparameter assignments.

use std::collections::BTreeMap;

use crate::param::ParamValue;

/// A mapping from hyperparameter name to a concrete value.
///
/// Configurations are produced by samplers (or built explicitly through
/// [`SearchSpace::configuration`](crate::SearchSpace::configuration)) and
/// consumed by pipeline factories. They are immutable once created: there
/// is no public way to add, change, or remove an assignment.
///
/// Categorical values are stored as an index plus the chosen label, so
/// factories can read them back by name with [`choice`](Self::choice).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    values: BTreeMap<String, ParamValue>,
    labels: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty configuration (every hyperparameter inactive).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: &str, value: ParamValue, label: Option<&str>) {
        if let Some(label) = label {
            self.labels.insert(name.to_owned(), label.to_owned());
        }
        self.values.insert(name.to_owned(), value);
    }

    /// Returns the raw value assigned to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns `true` if `name` is assigned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the float value of `name`, or `None` if unassigned or not a float.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name)? {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer value of `name`, or `None` if unassigned or not an integer.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the chosen label of a categorical hyperparameter.
    #[must_use]
    pub fn choice(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    /// Returns the chosen index of a categorical hyperparameter.
    #[must_use]
    pub fn categorical_index(&self, name: &str) -> Option<usize> {
        match self.values.get(name)? {
            ParamValue::Categorical(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number of assigned hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over assignments in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl core::fmt::Display for Configuration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.labels.get(name) {
                Some(label) => write!(f, "{name}={label}")?,
                None => write!(f, "{name}={value}")?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_match_kind() {
        let mut config = Configuration::empty();
        config.insert("alpha", ParamValue::Float(0.5), None);
        config.insert("k", ParamValue::Int(3), None);
        config.insert("kernel", ParamValue::Categorical(1), Some("poly"));

        assert_eq!(config.float("alpha"), Some(0.5));
        assert_eq!(config.int("alpha"), None);
        assert_eq!(config.int("k"), Some(3));
        assert_eq!(config.choice("kernel"), Some("poly"));
        assert_eq!(config.categorical_index("kernel"), Some(1));
        assert_eq!(config.len(), 3);
        assert!(!config.contains("degree"));
    }

    #[test]
    fn display_uses_labels() {
        let mut config = Configuration::empty();
        config.insert("kernel", ParamValue::Categorical(0), Some("linear"));
        config.insert("alpha", ParamValue::Float(2.0), None);
        assert_eq!(config.to_string(), "{alpha=2, kernel=linear}");
    }
}
