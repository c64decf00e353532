//! # Posebridge Demos
//!
//! Demo scenes driving a physics world and a motion-blur scene through the
//! bridge.
//!
//! ## Available Demos
//!
//! - `falling_objects` - random cubes and balls dropped onto a floor

pub mod falling_objects;

pub use falling_objects::{DemoConfig, DemoError, RunSummary};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
