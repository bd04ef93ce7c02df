//! Configuration errors.
//!
//! A missed ground probe is not an error: it is a `None` from
//! [`GroundQuery::sphere_cast`](crate::probe::GroundQuery::sphere_cast) and the solver
//! falls back to the airborne pose.

use thiserror::Error;

use crate::skeleton::HumanBone;

/// Result type for binding and calibration.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Fatal setup problems. Nothing is scaled or probed while one is outstanding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The skeleton does not report a humanoid biped topology.
    #[error("skeleton is not a humanoid biped")]
    NotBiped,

    /// A bone required by the biped binding could not be resolved.
    #[error("biped rig is missing bone {0:?}")]
    MissingBone(HumanBone),

    /// A handle resolved at binding time no longer resolves on the given skeleton.
    #[error("bone {0:?} is not bound on this skeleton; re-initialize the binding")]
    StaleBinding(HumanBone),

    /// A slider or tuning value outside its documented range.
    #[error("{name} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A NaN or infinite input.
    #[error("{name} is not finite")]
    NonFinite { name: &'static str },
}

/// Check that `value` is finite and inside the inclusive `range`.
pub(crate) fn check_range(
    name: &'static str,
    value: f32,
    range: (f32, f32),
) -> ConfigResult<()> {
    if !value.is_finite() {
        return Err(ConfigurationError::NonFinite { name });
    }
    if value < range.0 || value > range.1 {
        return Err(ConfigurationError::OutOfRange {
            name,
            value,
            min: range.0,
            max: range.1,
        });
    }
    Ok(())
}
