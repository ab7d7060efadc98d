//! Parameter value storage types.

/// Represents a sampled hyperparameter value.
///
/// For categorical hyperparameters the `Categorical` variant stores the
/// index into the declared choices; the label is kept alongside it in the
/// [`Configuration`](crate::Configuration).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// A floating-point value.
    Float(f64),
    /// An integer value.
    Int(i64),
    /// A categorical value, stored as an index into the choices array.
    Categorical(usize),
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Categorical(i) => write!(f, "#{i}"),
        }
    }
}
