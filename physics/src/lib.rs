//! # Posebridge Physics
//!
//! A [`PhysicsWorld`](posebridge::PhysicsWorld) over rapier3d in double
//! precision, with z-up gravity.

pub mod desc;
pub mod world;

pub use desc::{
    BodyDesc, BodyKind, ColliderDesc, GROUND_HALF_EXTENT, GROUND_HALF_THICKNESS, ShapeDesc,
};
pub use world::{PhysicsState, RapierWorld};

pub use rapier3d_f64::prelude::RigidBodyHandle;
