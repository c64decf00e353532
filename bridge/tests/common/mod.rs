//! In-memory physics and render doubles for bridge integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use posebridge::{BodyPose, BodyVelocity, PhysicsError, PhysicsWorld, RenderError, RenderScene};
use posebridge_core::math::{Quat, Real, Vec3, Vector3};

// ============================================================================
// Physics double
// ============================================================================

/// One body in [`MockPhysics`]. Velocities stay constant unless a test changes
/// them; `step_simulation` integrates position only.
#[derive(Debug, Clone, Copy)]
pub struct MockBody {
    pub pose: BodyPose,
    pub velocity: BodyVelocity,
}

#[derive(Debug, Default)]
pub struct MockPhysics {
    pub bodies: HashMap<u32, MockBody>,
    pub next_id: u32,
    pub time_step: Real,
    pub steps: u32,
    pub disconnected: bool,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, position: Vector3, linear: Vector3, angular: Vector3) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.insert(
            id,
            MockBody {
                pose: BodyPose::new(position, [0.0, 0.0, 0.0, 1.0]),
                velocity: BodyVelocity::new(linear, angular),
            },
        );
        id
    }

    pub fn body_mut(&mut self, id: u32) -> &mut MockBody {
        self.bodies.get_mut(&id).expect("mock body exists")
    }

    fn connected(&self) -> Result<(), PhysicsError> {
        if self.disconnected {
            Err(PhysicsError::NotConnected)
        } else {
            Ok(())
        }
    }

    fn lookup(&self, id: u32) -> Result<&MockBody, PhysicsError> {
        self.connected()?;
        self.bodies
            .get(&id)
            .ok_or_else(|| PhysicsError::UnknownBody(id.to_string()))
    }
}

impl PhysicsWorld for MockPhysics {
    type BodyId = u32;

    fn set_time_step(&mut self, seconds_per_step: Real) -> Result<(), PhysicsError> {
        self.connected()?;
        self.time_step = seconds_per_step;
        Ok(())
    }

    fn step_simulation(&mut self) -> Result<(), PhysicsError> {
        self.connected()?;
        let dt = self.time_step;
        for body in self.bodies.values_mut() {
            body.pose.position += body.velocity.linear * dt;
        }
        self.steps += 1;
        Ok(())
    }

    fn base_pose(&self, body: u32) -> Result<BodyPose, PhysicsError> {
        Ok(self.lookup(body)?.pose)
    }

    fn base_velocity(&self, body: u32) -> Result<BodyVelocity, PhysicsError> {
        Ok(self.lookup(body)?.velocity)
    }

    fn reset_base_pose(&mut self, body: u32, pose: &BodyPose) -> Result<(), PhysicsError> {
        self.connected()?;
        let entry = self
            .bodies
            .get_mut(&body)
            .ok_or_else(|| PhysicsError::UnknownBody(body.to_string()))?;
        entry.pose = *pose;
        Ok(())
    }
}

// ============================================================================
// Render double
// ============================================================================

/// Last values written to an entity of [`MockScene`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Written {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Quat,
    /// `(frames_per_second, mix)` passed with the last velocity write.
    pub velocity_args: (f32, f32),
    pub writes: u32,
}

impl Default for Written {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Quat::identity(),
            velocity_args: (1.0, 0.0),
            writes: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockScene {
    pub entities: HashMap<&'static str, Written>,
    pub renders: Vec<(u32, u32, u32, PathBuf)>,
    pub cleaned_up: bool,
}

impl MockScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, name: &'static str) {
        self.entities.insert(name, Written::default());
    }

    pub fn written(&self, name: &str) -> &Written {
        self.entities.get(name).expect("mock entity exists")
    }

    fn entity(&mut self, name: &'static str) -> Result<&mut Written, RenderError> {
        if self.cleaned_up {
            return Err(RenderError::NotInitialized);
        }
        self.entities
            .get_mut(name)
            .ok_or_else(|| RenderError::UnknownEntity(name.to_string()))
    }
}

impl RenderScene for MockScene {
    type EntityId = &'static str;

    fn set_position(&mut self, entity: &'static str, position: Vec3) -> Result<(), RenderError> {
        let written = self.entity(entity)?;
        written.position = position;
        written.writes += 1;
        Ok(())
    }

    fn set_rotation(&mut self, entity: &'static str, rotation: Quat) -> Result<(), RenderError> {
        self.entity(entity)?.rotation = rotation;
        Ok(())
    }

    fn set_linear_velocity(
        &mut self,
        entity: &'static str,
        velocity: Vec3,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError> {
        let written = self.entity(entity)?;
        written.linear_velocity = velocity;
        written.velocity_args = (frames_per_second, mix);
        Ok(())
    }

    fn set_angular_velocity(
        &mut self,
        entity: &'static str,
        velocity: Quat,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError> {
        let written = self.entity(entity)?;
        written.angular_velocity = velocity;
        written.velocity_args = (frames_per_second, mix);
        Ok(())
    }

    fn render_to_image(
        &mut self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
        path: &Path,
    ) -> Result<(), RenderError> {
        if self.cleaned_up {
            return Err(RenderError::NotInitialized);
        }
        self.renders
            .push((width, height, samples_per_pixel, path.to_path_buf()));
        Ok(())
    }
}
