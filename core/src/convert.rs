//! Unit and convention conversions between physics-side and renderer-side state.
//!
//! Physics engines report orientation as `[x, y, z, w]` and velocities in
//! units per simulated second. The renderer expects scalar-first quaternions
//! and velocities expressed per rendered frame. Everything here is pure so it
//! can be tested without either engine.

use crate::error::ConversionError;
use crate::math::{Quat, Real, UnitQuat, Vec3, Vector3, vec3_from_real};

/// Maximum deviation from unit norm accepted for a physics orientation.
///
/// Engines commonly integrate rotations in single precision, so the reported
/// quaternion drifts slightly off the unit sphere.
pub const UNIT_NORM_TOLERANCE: Real = 1e-3;

/// Default exponential-smoothing weight applied to velocities.
pub const DEFAULT_MIX: f32 = 0.8;

/// Permutes a vector-first `[x, y, z, w]` quaternion to scalar-first.
pub fn quat_xyzw_to_wxyz(q: [Real; 4]) -> Quat {
    Quat::new(q[3] as f32, q[0] as f32, q[1] as f32, q[2] as f32)
}

/// Permutes a scalar-first quaternion back to vector-first `[x, y, z, w]`.
pub fn quat_wxyz_to_xyzw(q: &Quat) -> [Real; 4] {
    [
        q.coords.x as Real,
        q.coords.y as Real,
        q.coords.z as Real,
        q.coords.w as Real,
    ]
}

/// Converts a physics orientation (`[x, y, z, w]`) into a renderer rotation.
///
/// The result is renormalised, so its norm is within single-precision
/// rounding of 1.
pub fn physics_orientation(xyzw: [Real; 4]) -> Result<UnitQuat, ConversionError> {
    if xyzw.iter().any(|c| !c.is_finite()) {
        return Err(ConversionError::NonFinite {
            what: "orientation",
        });
    }
    let norm = xyzw.iter().map(|c| c * c).sum::<Real>().sqrt();
    if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
        return Err(ConversionError::NotUnitNorm { norm });
    }
    let normalized = xyzw.map(|c| c / norm);
    Ok(UnitQuat::new_normalize(quat_xyzw_to_wxyz(normalized)))
}

/// Rejects vectors containing NaN or infinities.
pub fn finite_vector(v: &Vector3, what: &'static str) -> Result<Vector3, ConversionError> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(*v)
    } else {
        Err(ConversionError::NonFinite { what })
    }
}

/// Converts a linear velocity in units per second into units per frame.
pub fn linear_velocity_per_frame(velocity: &Vector3, frames_per_second: Real) -> Vec3 {
    vec3_from_real(&(velocity / frames_per_second))
}

/// Converts an angular velocity vector (radians per second) into the renderer's
/// per-frame quaternion form `(1, ωx/fps, ωy/fps, ωz/fps)`.
pub fn angular_velocity_per_frame(omega: &Vector3, frames_per_second: Real) -> Quat {
    let w = vec3_from_real(&(omega / frames_per_second));
    Quat::new(1.0, w.x, w.y, w.z)
}

/// Number of physics steps of length `seconds_per_step` that cover one frame
/// at `frames_per_second`: `ceil((1 / dt) / fps)`, at least one.
pub fn steps_per_frame(
    seconds_per_step: Real,
    frames_per_second: Real,
) -> Result<u32, ConversionError> {
    let valid = |x: Real| x.is_finite() && x > 0.0;
    if !valid(seconds_per_step) || !valid(frames_per_second) {
        return Err(ConversionError::InvalidTiming {
            seconds_per_step,
            frames_per_second,
        });
    }
    let ratio = (1.0 / seconds_per_step) / frames_per_second;
    // 1e-9 absorbs rounding in 1/dt so exact ratios don't round up
    let steps = (ratio - 1e-9).ceil();
    if steps > u32::MAX as Real {
        return Err(ConversionError::InvalidTiming {
            seconds_per_step,
            frames_per_second,
        });
    }
    Ok((steps as u32).max(1))
}

/// Clamps a mix coefficient to `[0, 1]`. NaN means no smoothing.
pub fn clamp_mix(mix: f32) -> f32 {
    if mix.is_nan() { 0.0 } else { mix.clamp(0.0, 1.0) }
}

/// `mix * previous + (1 - mix) * raw`.
pub fn smooth_vec3(previous: &Vec3, raw: &Vec3, mix: f32) -> Vec3 {
    previous.lerp(raw, 1.0 - clamp_mix(mix))
}

/// Component-wise `mix * previous + (1 - mix) * raw` on quaternion coordinates.
pub fn smooth_quat(previous: &Quat, raw: &Quat, mix: f32) -> Quat {
    previous.lerp(raw, 1.0 - clamp_mix(mix))
}

/// Exponential moving average of one body's per-frame velocities.
///
/// Starts at rest: zero linear velocity and the identity angular quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySmoother {
    linear: Vec3,
    angular: Quat,
    mix: f32,
}

impl Default for VelocitySmoother {
    fn default() -> Self {
        Self::new(DEFAULT_MIX)
    }
}

impl VelocitySmoother {
    /// Creates a smoother at rest with the given mix (clamped to `[0, 1]`).
    pub fn new(mix: f32) -> Self {
        Self {
            linear: Vec3::zeros(),
            angular: Quat::identity(),
            mix: clamp_mix(mix),
        }
    }

    /// Smoothed per-frame linear velocity.
    pub fn linear(&self) -> Vec3 {
        self.linear
    }

    /// Smoothed per-frame angular velocity quaternion.
    pub fn angular(&self) -> Quat {
        self.angular
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Folds one raw per-frame sample into the average and returns the new
    /// smoothed `(linear, angular)` pair.
    pub fn update(&mut self, raw_linear: &Vec3, raw_angular: &Quat) -> (Vec3, Quat) {
        self.linear = smooth_vec3(&self.linear, raw_linear, self.mix);
        self.angular = smooth_quat(&self.angular, raw_angular, self.mix);
        (self.linear, self.angular)
    }

    /// Forgets the history, returning to rest.
    pub fn reset(&mut self) {
        self.linear = Vec3::zeros();
        self.angular = Quat::identity();
    }
}
