//! Shared distribution-level utilities used across multiple samplers.

use crate::configuration::Configuration;
use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::space::{Hyperparameter, SearchSpace};

/// Compute internal-space bounds for a distribution.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn internal_bounds(distribution: &Distribution) -> Option<(f64, f64)> {
    match distribution {
        Distribution::Float(d) => {
            if d.log_scale {
                if d.low <= 0.0 || d.high <= 0.0 {
                    return None;
                }
                Some((d.low.ln(), d.high.ln()))
            } else {
                Some((d.low, d.high))
            }
        }
        Distribution::Int(d) => {
            if d.log_scale {
                if d.low < 1 {
                    return None;
                }
                Some(((d.low as f64).ln(), (d.high as f64).ln()))
            } else {
                Some((d.low as f64, d.high as f64))
            }
        }
        Distribution::Categorical(_) => None,
    }
}

/// Convert an internal-space value back to a `ParamValue`.
///
/// Returns `None` for categorical distributions, which have no internal
/// numeric space.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn from_internal(value: f64, distribution: &Distribution) -> Option<ParamValue> {
    match distribution {
        Distribution::Float(d) => {
            let v = if d.log_scale { value.exp() } else { value };
            let v = if let Some(step) = d.step {
                let k = ((v - d.low) / step).round();
                d.low + k * step
            } else {
                v
            };
            let v = match d.step {
                // Rounding up to the next grid point can overshoot `high`.
                Some(step) if v > d.high => v - step,
                _ => v,
            };
            Some(ParamValue::Float(v.clamp(d.low, d.high)))
        }
        Distribution::Int(d) => {
            let v = if d.log_scale { value.exp() } else { value };
            let v = if let Some(step) = d.step {
                let k = ((v - d.low as f64) / step as f64).round() as i64;
                let snapped = d.low.saturating_add(k.saturating_mul(step));
                if snapped > d.high { snapped - step } else { snapped }
            } else {
                v.round() as i64
            };
            Some(ParamValue::Int(v.clamp(d.low, d.high)))
        }
        Distribution::Categorical(_) => None,
    }
}

/// Convert a `ParamValue` to its internal-space representation.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_internal(value: &ParamValue, distribution: &Distribution) -> Option<f64> {
    match (value, distribution) {
        (ParamValue::Float(v), Distribution::Float(d)) => {
            Some(if d.log_scale { v.ln() } else { *v })
        }
        (ParamValue::Int(v), Distribution::Int(d)) => {
            Some(if d.log_scale { (*v as f64).ln() } else { *v as f64 })
        }
        _ => None,
    }
}

/// Uniform in `[low, high]`.
///
/// Interpolates instead of scaling `high - low`, which overflows for spans
/// wider than `f64::MAX`.
fn uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    let u = rng.f64();
    (1.0 - u).mul_add(low, u * high)
}

/// Sample a random value for any distribution.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn sample_random(rng: &mut fastrand::Rng, distribution: &Distribution) -> ParamValue {
    match distribution {
        Distribution::Float(d) => {
            let value = if d.log_scale {
                let log_low = d.low.ln();
                let log_high = d.high.ln();
                let v = uniform(rng, log_low, log_high).exp();
                if let Some(step) = d.step {
                    let k = ((v - d.low) / step).round();
                    let snapped = d.low + k * step;
                    if snapped > d.high { snapped - step } else { snapped }
                } else {
                    v
                }
            } else if let Some(step) = d.step {
                let n_steps = (d.high / step - d.low / step).floor() as i64;
                let k = rng.i64(0..=n_steps.max(0));
                // Offset by two half steps so `low + k * step` cannot overflow.
                let half = (k as f64) * step / 2.0;
                d.low + half + half
            } else {
                uniform(rng, d.low, d.high)
            };
            ParamValue::Float(value.clamp(d.low, d.high))
        }
        Distribution::Int(d) => {
            let value = if d.log_scale {
                let log_low = (d.low as f64).ln();
                let log_high = (d.high as f64).ln();
                let v = uniform(rng, log_low, log_high).exp();
                let raw = if let Some(step) = d.step {
                    let k = ((v - d.low as f64) / step as f64).round() as i64;
                    let snapped = d.low.saturating_add(k.saturating_mul(step));
                    if snapped > d.high { snapped - step } else { snapped }
                } else {
                    v.round() as i64
                };
                raw.clamp(d.low, d.high)
            } else if let Some(step) = d.step {
                let span = i128::from(d.high) - i128::from(d.low);
                let n_steps = u64::try_from(span / i128::from(step)).unwrap_or(u64::MAX);
                let k = i128::from(rng.u64(0..=n_steps));
                i64::try_from(i128::from(d.low) + k * i128::from(step)).unwrap_or(d.high)
            } else {
                rng.i64(d.low..=d.high)
            };
            ParamValue::Int(value)
        }
        Distribution::Categorical(d) => ParamValue::Categorical(rng.usize(0..d.n_choices)),
    }
}

/// Label of a categorical value, if `param` is categorical.
pub(crate) fn label_for<'a>(param: &'a Hyperparameter, value: &ParamValue) -> Option<&'a str> {
    match value {
        ParamValue::Categorical(i) => param.choices()?.get(*i).map(String::as_str),
        _ => None,
    }
}

/// Walks the space in declaration order, assigning every active
/// hyperparameter with `pick` and skipping inactive ones.
///
/// Parents are always declared before their children, so each activation
/// rule is evaluated against a fully decided prefix.
pub(crate) fn assign_in_order(
    space: &SearchSpace,
    mut pick: impl FnMut(&Hyperparameter, &Configuration) -> ParamValue,
) -> Configuration {
    let mut config = Configuration::empty();
    for param in space.hyperparameters() {
        if !space.is_active(param, &config) {
            continue;
        }
        let value = pick(param, &config);
        let label = label_for(param, &value);
        config.insert(param.name(), value, label);
    }
    config
}

/// Draw a uniformly random valid configuration.
pub(crate) fn random_configuration(rng: &mut fastrand::Rng, space: &SearchSpace) -> Configuration {
    assign_in_order(space, |param, _| sample_random(rng, &param.distribution()))
}
