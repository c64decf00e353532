//! # Posebridge Core
//!
//! Math aliases and the pure conversions used to carry rigid-body state from a
//! physics engine into a motion-blur capable renderer.

pub mod convert;
pub mod error;
pub mod math;
pub mod profiling;

pub use convert::VelocitySmoother;
pub use error::ConversionError;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
