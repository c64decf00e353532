//! Error type for unit and convention conversions.

use thiserror::Error;

/// Errors produced while converting physics-side state into renderer-side state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// A vector or quaternion contains NaN or an infinity.
    #[error("{what} has a non-finite component")]
    NonFinite {
        /// Which quantity was rejected (e.g. `"orientation"`).
        what: &'static str,
    },
    /// An orientation quaternion is too far from unit length to be a rotation.
    #[error("orientation quaternion is not unit length (norm {norm})")]
    NotUnitNorm {
        /// Euclidean norm of the rejected quaternion.
        norm: f64,
    },
    /// Step length or frame rate is zero, negative, or non-finite.
    #[error(
        "invalid timing: seconds_per_step={seconds_per_step}, frames_per_second={frames_per_second}"
    )]
    InvalidTiming {
        seconds_per_step: f64,
        frames_per_second: f64,
    },
}
