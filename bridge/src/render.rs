//! The renderer side of the bridge.

use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

use posebridge_core::math::{Quat, Vec3};

use crate::error::RenderError;

/// A renderer scene whose entities carry a transform and motion-blur velocities.
///
/// Velocity setters follow the renderer convention: the given velocity is
/// divided by `frames_per_second` and blended with the entity's current
/// velocity as `mix * current + (1 - mix) * new`. Passing `1.0` and `0.0`
/// writes the value unchanged.
pub trait RenderScene {
    /// Renderer handle for an entity.
    type EntityId: Copy + Eq + Hash + Debug;

    fn set_position(&mut self, entity: Self::EntityId, position: Vec3) -> Result<(), RenderError>;

    /// Sets the rotation from a scalar-first quaternion.
    fn set_rotation(&mut self, entity: Self::EntityId, rotation: Quat) -> Result<(), RenderError>;

    /// Sets the linear velocity used for motion blur.
    fn set_linear_velocity(
        &mut self,
        entity: Self::EntityId,
        velocity: Vec3,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError>;

    /// Sets the angular velocity used for motion blur, as `(1, ωx, ωy, ωz)`.
    fn set_angular_velocity(
        &mut self,
        entity: Self::EntityId,
        velocity: Quat,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError>;

    /// Renders the scene and writes the image to `path`.
    fn render_to_image(
        &mut self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
        path: &Path,
    ) -> Result<(), RenderError>;
}
