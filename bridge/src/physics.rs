//! The physics side of the bridge.

use std::fmt::Debug;
use std::hash::Hash;

use posebridge_core::math::{Real, Vector3};

use crate::error::PhysicsError;

/// Position and orientation of a body as the physics engine reports them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// World position in physics units (meters).
    pub position: Vector3,
    /// Orientation quaternion in the engine's `[x, y, z, w]` order.
    pub orientation: [Real; 4],
}

impl BodyPose {
    pub fn new(position: Vector3, orientation: [Real; 4]) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Linear and angular velocity of a body, per simulated second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyVelocity {
    /// Meters per second.
    pub linear: Vector3,
    /// Radians per second around each world axis.
    pub angular: Vector3,
}

impl BodyVelocity {
    pub fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }
}

/// A rigid-body simulation the bridge can step and query.
///
/// Implementations own all simulation state. Every call blocks until the
/// engine has finished; the bridge never overlaps two calls.
pub trait PhysicsWorld {
    /// Engine handle for a body.
    type BodyId: Copy + Eq + Hash + Debug;

    /// Sets the integration step length in seconds.
    fn set_time_step(&mut self, seconds_per_step: Real) -> Result<(), PhysicsError>;

    /// Advances the simulation by one integration step.
    fn step_simulation(&mut self) -> Result<(), PhysicsError>;

    /// Current position and orientation of `body`.
    fn base_pose(&self, body: Self::BodyId) -> Result<BodyPose, PhysicsError>;

    /// Current linear and angular velocity of `body`.
    fn base_velocity(&self, body: Self::BodyId) -> Result<BodyVelocity, PhysicsError>;

    /// Teleports `body` to `pose` without changing its velocity.
    fn reset_base_pose(&mut self, body: Self::BodyId, pose: &BodyPose)
    -> Result<(), PhysicsError>;
}
