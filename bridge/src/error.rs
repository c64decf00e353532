//! Error taxonomy for the synchronization bridge.
//!
//! Collaborators report [`PhysicsError`] and [`RenderError`]. The bridge sorts
//! them into per-body [`SyncError`]s, which skip a single body for one frame,
//! and fatal [`BridgeError`]s, which end the run.

use posebridge_core::ConversionError;
use thiserror::Error;

use crate::rigid_body::RigidBodyHandle;

/// Errors reported by a [`PhysicsWorld`](crate::PhysicsWorld).
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// The physics engine has been disconnected or was never started.
    #[error("physics engine is not connected")]
    NotConnected,
    /// The body id does not resolve in the physics world.
    #[error("unknown physics body {0}")]
    UnknownBody(String),
}

/// Errors reported by a [`RenderScene`](crate::RenderScene).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer has been cleaned up or was never initialized.
    #[error("renderer is not initialized")]
    NotInitialized,
    /// The entity id does not resolve in the render scene.
    #[error("unknown render entity {0}")]
    UnknownEntity(String),
    /// Encoding a rendered image failed.
    #[error("image encode error: {0}")]
    Image(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure confined to one tracked body for one step.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The physics body behind the mapping no longer exists.
    #[error("physics body {0} no longer exists")]
    UnknownBody(String),
    /// The render entity behind the mapping no longer exists.
    #[error("render entity {0} no longer exists")]
    UnknownEntity(String),
    /// The physics engine reported state that cannot be handed to the renderer.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors returned by [`PoseSyncBridge`](crate::PoseSyncBridge) operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Step length or frame rate cannot produce a frame.
    #[error(transparent)]
    Timing(ConversionError),
    /// Another tracked body already uses this render entity.
    #[error("render entity {0} is already tracked")]
    DuplicateRenderId(String),
    /// Another tracked body already uses this physics body.
    #[error("physics body {0} is already tracked")]
    DuplicatePhysicsId(String),
    /// The handle does not refer to a tracked body.
    #[error("no tracked rigid body for {0:?}")]
    StaleHandle(RigidBodyHandle),
    /// A single-body operation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Outcome of a failed per-body operation: skip the body or stop the run.
#[derive(Debug)]
pub(crate) enum BodyFailure {
    Skip(SyncError),
    Fatal(BridgeError),
}

impl From<PhysicsError> for BodyFailure {
    fn from(err: PhysicsError) -> Self {
        match err {
            PhysicsError::UnknownBody(id) => Self::Skip(SyncError::UnknownBody(id)),
            other => Self::Fatal(BridgeError::Physics(other)),
        }
    }
}

impl From<RenderError> for BodyFailure {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownEntity(id) => Self::Skip(SyncError::UnknownEntity(id)),
            other => Self::Fatal(BridgeError::Render(other)),
        }
    }
}

impl From<ConversionError> for BodyFailure {
    fn from(err: ConversionError) -> Self {
        Self::Skip(SyncError::Conversion(err))
    }
}

impl From<BodyFailure> for BridgeError {
    fn from(failure: BodyFailure) -> Self {
        match failure {
            BodyFailure::Skip(err) => BridgeError::Sync(err),
            BodyFailure::Fatal(err) => err,
        }
    }
}
