//! Search space declaration and configuration validation.
//!
//! A [`SearchSpace`] is an ordered list of [`Hyperparameter`]s. Each
//! hyperparameter has a [`Domain`] and may carry a [`Condition`] that
//! decides whether it is active for a given assignment of the
//! hyperparameters declared before it.
//!
//! Activation rules live in the space, not in the samplers, so every
//! sampler skips inactive dimensions the same way and the study can check
//! that proposals are complete.
//!
//! # Example
//!
//! ```
//! use tuner::space::{Condition, Hyperparameter, SearchSpace};
//!
//! let space = SearchSpace::builder()
//!     .add(Hyperparameter::float("alpha", 0.1, 10.0).log_scale())
//!     .add(Hyperparameter::categorical("kernel", ["linear", "poly"]))
//!     .add(Hyperparameter::int("degree", 2, 5).active_when(Condition::equals("kernel", "poly")))
//!     .build()
//!     .unwrap();
//!
//! let linear = space
//!     .configuration()
//!     .float("alpha", 1.0)
//!     .choice("kernel", "linear")
//!     .build()
//!     .unwrap();
//! assert!(space.is_valid(&linear));
//!
//! let leaky = space
//!     .configuration()
//!     .float("alpha", 1.0)
//!     .choice("kernel", "linear")
//!     .int("degree", 3)
//!     .build()
//!     .unwrap();
//! assert!(space.validate(&leaky).is_err());
//! ```

mod condition;
mod hyperparameter;

use std::collections::HashMap;

pub use condition::Condition;
pub use hyperparameter::{Domain, Hyperparameter, Scale};

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::param::ParamValue;

/// A validated, ordered set of hyperparameters.
///
/// Construct with [`SearchSpace::builder`]. Parents of a condition are
/// always declared before the hyperparameter that depends on them, so
/// walking [`hyperparameters`](Self::hyperparameters) in order visits every
/// parent first.
#[derive(Clone, Debug)]
pub struct SearchSpace {
    params: Vec<Hyperparameter>,
    index: HashMap<String, usize>,
}

impl SearchSpace {
    /// Returns a builder for declaring hyperparameters.
    #[must_use]
    pub fn builder() -> SearchSpaceBuilder {
        SearchSpaceBuilder::default()
    }

    /// Returns the declared hyperparameters in declaration order.
    #[must_use]
    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.params
    }

    /// Looks up a hyperparameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Returns the number of declared hyperparameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no hyperparameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns whether `param` is active under the given (partial) assignment.
    #[must_use]
    pub fn is_active(&self, param: &Hyperparameter, assigned: &Configuration) -> bool {
        param.condition().is_none_or(|c| c.holds(assigned))
    }

    /// Checks a configuration against the space.
    ///
    /// Every active hyperparameter must be assigned a value of the right
    /// kind inside its bounds; every inactive one must be absent; no
    /// undeclared names may appear.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] describing the first violation,
    /// or [`Error::UnknownParameter`] for an undeclared name.
    pub fn validate(&self, config: &Configuration) -> Result<()> {
        for (name, _) in config.iter() {
            if !self.index.contains_key(name) {
                return Err(Error::UnknownParameter(name.to_owned()));
            }
        }

        for param in &self.params {
            let name = param.name();
            let active = self.is_active(param, config);
            match (active, config.get(name)) {
                (true, None) => {
                    return Err(invalid(name, "active hyperparameter is unassigned"));
                }
                (false, Some(_)) => {
                    return Err(invalid(name, "inactive hyperparameter is assigned"));
                }
                (true, Some(value)) => {
                    if !param.distribution().contains(value) {
                        return Err(invalid(name, &format!("value {value} is out of domain")));
                    }
                    if let ParamValue::Categorical(index) = value {
                        let expected = param.choices().and_then(|c| c.get(*index));
                        if config.choice(name) != expected.map(String::as_str) {
                            return Err(invalid(name, "label does not match choice index"));
                        }
                    }
                }
                (false, None) => {}
            }
        }
        Ok(())
    }

    /// Boolean form of [`validate`](Self::validate).
    #[must_use]
    pub fn is_valid(&self, config: &Configuration) -> bool {
        self.validate(config).is_ok()
    }

    /// Starts building a configuration by hand.
    ///
    /// The builder resolves categorical labels but does not check activation
    /// or bounds; call [`validate`](Self::validate) for that.
    #[must_use]
    pub fn configuration(&self) -> ConfigurationBuilder<'_> {
        ConfigurationBuilder {
            space: self,
            config: Configuration::empty(),
            error: None,
        }
    }
}

fn invalid(name: &str, reason: &str) -> Error {
    Error::InvalidConfiguration {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Builder for [`SearchSpace`].
#[derive(Clone, Debug, Default)]
pub struct SearchSpaceBuilder {
    params: Vec<Hyperparameter>,
}

impl SearchSpaceBuilder {
    /// Appends a hyperparameter.
    #[must_use]
    pub fn add(mut self, param: Hyperparameter) -> Self {
        self.params.push(param);
        self
    }

    /// Shorthand for a linear float hyperparameter.
    #[must_use]
    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Hyperparameter::float(name, low, high))
    }

    /// Shorthand for a log-scale float hyperparameter.
    #[must_use]
    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(Hyperparameter::float(name, low, high).log_scale())
    }

    /// Shorthand for a linear integer hyperparameter.
    #[must_use]
    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(Hyperparameter::int(name, low, high))
    }

    /// Shorthand for a categorical hyperparameter.
    #[must_use]
    pub fn categorical<I, S>(self, name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(Hyperparameter::categorical(name, choices))
    }

    /// Validates the schema and builds the space.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateParameter`] if a name is declared twice.
    /// - Domain errors ([`Error::InvalidBounds`], [`Error::InvalidLogBounds`],
    ///   [`Error::InvalidStep`], [`Error::EmptyChoices`]).
    /// - [`Error::UnknownParameter`] if a condition names an undeclared parent.
    /// - [`Error::InvalidSearchSpace`] if a condition refers to a later
    ///   parameter, to itself, or to a label/kind the parent cannot take.
    pub fn build(self) -> Result<SearchSpace> {
        let mut index = HashMap::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            param.validate_domain()?;
            if index.insert(param.name().to_owned(), i).is_some() {
                return Err(Error::DuplicateParameter(param.name().to_owned()));
            }
        }

        for (i, param) in self.params.iter().enumerate() {
            if let Some(condition) = param.condition() {
                check_condition(condition, param.name(), i, &self.params, &index)?;
            }
        }

        Ok(SearchSpace {
            params: self.params,
            index,
        })
    }
}

fn check_condition(
    condition: &Condition,
    child: &str,
    child_pos: usize,
    params: &[Hyperparameter],
    index: &HashMap<String, usize>,
) -> Result<()> {
    let parent_of = |parent: &str| -> Result<&Hyperparameter> {
        let &pos = index
            .get(parent)
            .ok_or_else(|| Error::UnknownParameter(parent.to_owned()))?;
        if pos >= child_pos {
            return Err(Error::InvalidSearchSpace(format!(
                "'{child}' depends on '{parent}', which must be declared before it"
            )));
        }
        Ok(&params[pos])
    };

    match condition {
        Condition::Equals { parent, value } => {
            let p = parent_of(parent)?;
            if p.index_of(value).is_none() {
                return Err(Error::InvalidSearchSpace(format!(
                    "'{child}' depends on '{parent}' == '{value}', which is not a choice"
                )));
            }
        }
        Condition::OneOf { parent, values } => {
            let p = parent_of(parent)?;
            if let Some(bad) = values.iter().find(|v| p.index_of(v).is_none()) {
                return Err(Error::InvalidSearchSpace(format!(
                    "'{child}' depends on '{parent}' taking '{bad}', which is not a choice"
                )));
            }
        }
        Condition::IntRange { parent, .. } => {
            let p = parent_of(parent)?;
            if !matches!(p.domain(), Domain::Int { .. }) {
                return Err(Error::InvalidSearchSpace(format!(
                    "'{child}' uses an integer range on non-integer '{parent}'"
                )));
            }
        }
        Condition::All(conditions) | Condition::Any(conditions) => {
            for c in conditions {
                check_condition(c, child, child_pos, params, index)?;
            }
        }
    }
    Ok(())
}

/// Builds a [`Configuration`] by name, resolving categorical labels.
///
/// Obtained from [`SearchSpace::configuration`].
#[derive(Debug)]
pub struct ConfigurationBuilder<'a> {
    space: &'a SearchSpace,
    config: Configuration,
    error: Option<Error>,
}

impl ConfigurationBuilder<'_> {
    /// Assigns a float value.
    #[must_use]
    pub fn float(mut self, name: &str, value: f64) -> Self {
        self.config.insert(name, ParamValue::Float(value), None);
        self
    }

    /// Assigns an integer value.
    #[must_use]
    pub fn int(mut self, name: &str, value: i64) -> Self {
        self.config.insert(name, ParamValue::Int(value), None);
        self
    }

    /// Assigns a categorical value by label.
    #[must_use]
    pub fn choice(mut self, name: &str, label: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.space.get(name) {
            Some(param) => match param.index_of(label) {
                Some(i) => self
                    .config
                    .insert(name, ParamValue::Categorical(i), Some(label)),
                None => self.error = Some(invalid(name, &format!("'{label}' is not a choice"))),
            },
            None => self.error = Some(Error::UnknownParameter(name.to_owned())),
        }
        self
    }

    /// Assigns a raw value; categorical indices get their label attached.
    #[must_use]
    pub fn value(mut self, name: &str, value: ParamValue) -> Self {
        let label = match (&value, self.space.get(name)) {
            (ParamValue::Categorical(i), Some(param)) => {
                param.choices().and_then(|c| c.get(*i)).cloned()
            }
            _ => None,
        };
        self.config.insert(name, value, label.as_deref());
        self
    }

    /// Finishes the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a categorical label could not be resolved.
    pub fn build(self) -> Result<Configuration> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.config),
        }
    }
}
