//! Transforms that carry motion-blur velocities.

use posebridge_core::convert::clamp_mix;
use posebridge_core::math::{Mat4, Quat, UnitQuat, Vec3, mat4_from_scale_rotation_translation};

/// Position, rotation and scale of an entity together with the per-frame
/// velocities used to compute its end-of-shutter transform.
///
/// # Example
///
/// ```
/// use posebridge_scene::MotionTransform;
/// use posebridge_core::math::Vec3;
///
/// let mut transform = MotionTransform::from_position(Vec3::new(0.0, 0.0, 1.0));
/// transform.set_linear_velocity(Vec3::new(3.0, 0.0, 0.0), 30.0, 0.0);
/// assert_eq!(transform.next_position(), Vec3::new(0.1, 0.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTransform {
    pub position: Vec3,
    /// Scalar-first rotation, kept normalized.
    pub rotation: Quat,
    pub scale: Vec3,
    /// Translation per frame.
    pub linear_velocity: Vec3,
    /// Rotation per frame as `(1, ωx, ωy, ωz)`.
    pub angular_velocity: Quat,
    /// Additional scale per frame.
    pub scalar_velocity: Vec3,
}

impl Default for MotionTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Normalizes `q`, or `None` for a zero or non-finite quaternion.
fn normalized(q: Quat) -> Option<Quat> {
    let norm = q.norm();
    (norm > f32::EPSILON && norm.is_finite()).then(|| q / norm)
}

impl MotionTransform {
    /// Identity transform at rest.
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Quat::identity(),
            scalar_velocity: Vec3::zeros(),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation(rotation);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the rotation, normalizing it. A zero quaternion leaves the
    /// rotation unchanged.
    pub fn set_rotation(&mut self, rotation: Quat) {
        if let Some(unit) = normalized(rotation) {
            self.rotation = unit;
        }
    }

    /// `linear = mix * linear + (1 - mix) * velocity / frames_per_second`.
    pub fn set_linear_velocity(&mut self, velocity: Vec3, frames_per_second: f32, mix: f32) {
        let per_frame = velocity / frames_per_second;
        self.linear_velocity = self.linear_velocity.lerp(&per_frame, 1.0 - clamp_mix(mix));
    }

    /// Divides the vector part of `velocity` by `frames_per_second` and blends
    /// it into the angular velocity like
    /// [`set_linear_velocity`](Self::set_linear_velocity).
    pub fn set_angular_velocity(&mut self, velocity: Quat, frames_per_second: f32, mix: f32) {
        let per_frame = Quat::new(
            velocity.w,
            velocity.i / frames_per_second,
            velocity.j / frames_per_second,
            velocity.k / frames_per_second,
        );
        self.angular_velocity = self.angular_velocity.lerp(&per_frame, 1.0 - clamp_mix(mix));
    }

    pub fn set_scalar_velocity(&mut self, velocity: Vec3, frames_per_second: f32, mix: f32) {
        let per_frame = velocity / frames_per_second;
        self.scalar_velocity = self.scalar_velocity.lerp(&per_frame, 1.0 - clamp_mix(mix));
    }

    /// Clears all velocities.
    pub fn clear_motion(&mut self) {
        self.linear_velocity = Vec3::zeros();
        self.angular_velocity = Quat::identity();
        self.scalar_velocity = Vec3::zeros();
    }

    pub fn next_position(&self) -> Vec3 {
        self.position + self.linear_velocity
    }

    /// Rotation at the end of the shutter interval.
    pub fn next_rotation(&self) -> Quat {
        let spin = normalized(self.angular_velocity).unwrap_or_else(Quat::identity);
        normalized(spin * self.rotation).unwrap_or(self.rotation)
    }

    pub fn next_scale(&self) -> Vec3 {
        self.scale + self.scalar_velocity
    }

    pub fn local_to_world(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn next_local_to_world(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(
            self.next_scale(),
            self.next_rotation(),
            self.next_position(),
        )
    }

    /// Local-to-world matrix at shutter time `t` in `[0, 1]`, interpolating
    /// between the current and the next transform.
    pub fn local_to_world_at(&self, t: f32) -> Mat4 {
        let t = t.clamp(0.0, 1.0);
        let from = UnitQuat::new_unchecked(self.rotation);
        let to = UnitQuat::new_unchecked(self.next_rotation());
        let rotation = from.try_slerp(&to, t, 1e-6).unwrap_or(from);
        mat4_from_scale_rotation_translation(
            self.scale.lerp(&self.next_scale(), t),
            rotation.into_inner(),
            self.position.lerp(&self.next_position(), t),
        )
    }

    /// Whether the entity moves during the shutter interval.
    pub fn is_moving(&self) -> bool {
        self.linear_velocity != Vec3::zeros()
            || self.scalar_velocity != Vec3::zeros()
            || self.angular_velocity.imag() != Vec3::zeros()
    }
}
