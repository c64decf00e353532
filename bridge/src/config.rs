//! Bridge configuration.

use serde::{Deserialize, Serialize};

use posebridge_core::ConversionError;
use posebridge_core::convert::{DEFAULT_MIX, clamp_mix, steps_per_frame};
use posebridge_core::math::Real;

/// Timing, smoothing, and output settings for a [`PoseSyncBridge`](crate::PoseSyncBridge).
///
/// Missing fields fall back to [`BridgeConfig::default`] when deserializing.
///
/// # Example
///
/// ```
/// use posebridge::BridgeConfig;
///
/// let config = BridgeConfig::default()
///     .with_frames_per_second(60.0)
///     .with_mix(0.5);
/// assert_eq!(config.steps_per_frame().unwrap(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Velocity smoothing weight in `[0, 1]`; higher is smoother.
    pub mix: f32,
    /// Physics integration step length in seconds.
    pub seconds_per_step: Real,
    /// Notional output frame rate of the renderer.
    pub frames_per_second: Real,
    /// Output image width in pixels.
    pub width: u32,
    /// Output image height in pixels.
    pub height: u32,
    /// Samples per pixel; also the number of shutter samples for motion blur.
    pub samples_per_pixel: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mix: DEFAULT_MIX,
            seconds_per_step: 0.01,
            frames_per_second: 30.0,
            width: 500,
            height: 500,
            samples_per_pixel: 20,
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn with_mix(mut self, mix: f32) -> Self {
        self.mix = clamp_mix(mix);
        self
    }

    #[must_use]
    pub fn with_seconds_per_step(mut self, seconds_per_step: Real) -> Self {
        self.seconds_per_step = seconds_per_step;
        self
    }

    #[must_use]
    pub fn with_frames_per_second(mut self, frames_per_second: Real) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    /// Physics steps per rendered frame for this configuration.
    pub fn steps_per_frame(&self) -> Result<u32, ConversionError> {
        steps_per_frame(self.seconds_per_step, self.frames_per_second)
    }
}
