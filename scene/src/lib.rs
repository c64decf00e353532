//! # Posebridge Scene
//!
//! A small renderer-side scene of moving boxes and spheres. It implements
//! [`RenderScene`](posebridge::RenderScene) with the usual motion-blur
//! velocity rules and writes rasterized PNG or HDR previews, so the bridge can be
//! run and inspected without a full renderer.

pub mod camera;
pub mod entity;
mod raster;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use entity::EntityId;
pub use scene::{DataKind, MotionScene, SceneEntity, Shape};
pub use transform::MotionTransform;
