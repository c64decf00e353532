//! # Posebridge
//!
//! Carries rigid-body state from a physics simulation into a renderer that
//! supports motion blur.
//!
//! Both engines are injected behind the [`PhysicsWorld`] and [`RenderScene`]
//! traits. [`PoseSyncBridge`] keeps the 1:1 mapping between physics bodies and
//! render entities, advances physics by whole frames, converts orientation
//! order and velocity units, and smooths velocities so motion blur does not
//! flicker from frame to frame.

pub mod config;
pub mod error;
pub mod physics;
pub mod render;
pub mod rigid_body;
pub mod sync;

pub use config::BridgeConfig;
pub use error::{BridgeError, PhysicsError, RenderError, SyncError};
pub use physics::{BodyPose, BodyVelocity, PhysicsWorld};
pub use render::RenderScene;
pub use rigid_body::{RigidBody, RigidBodyHandle, RigidBodySet, TrackedBody};
pub use sync::{PoseSyncBridge, SkippedBody, StepReport};
