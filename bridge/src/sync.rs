//! The pose-sync bridge.
//!
//! Each [`PoseSyncBridge::step`] advances physics by the number of sub-steps
//! that cover one rendered frame, then copies every tracked body's pose into
//! the renderer and writes exponentially smoothed per-frame velocities for
//! motion blur.

use std::path::Path;

use posebridge_core::VelocitySmoother;
use posebridge_core::convert::{
    angular_velocity_per_frame, finite_vector, linear_velocity_per_frame, physics_orientation,
    quat_wxyz_to_xyzw, steps_per_frame,
};
use posebridge_core::math::{Quat, Real, Vec3, vec3_from_real, vec3_to_real};
use posebridge_core::{profile_plot, profile_scope};

use crate::config::BridgeConfig;
use crate::error::{BodyFailure, BridgeError, PhysicsError, SyncError};
use crate::physics::{BodyPose, PhysicsWorld};
use crate::render::RenderScene;
use crate::rigid_body::{RigidBody, RigidBodyHandle, RigidBodySet, TrackedBody};

/// Frame rate handed to renderer velocity setters. Velocities are already per
/// frame when the bridge writes them.
const PER_FRAME: f32 = 1.0;

/// Renderer-side mix. Smoothing happens in the bridge, so the renderer must
/// not blend again.
const NO_MIX: f32 = 0.0;

/// A body skipped during one step.
#[derive(Debug)]
pub struct SkippedBody {
    pub handle: RigidBodyHandle,
    pub error: SyncError,
}

/// Summary of one [`PoseSyncBridge::step`].
#[derive(Debug, Default)]
pub struct StepReport {
    /// Zero-based index of the frame this step produced.
    pub frame: u64,
    /// Physics sub-steps executed before synchronizing.
    pub substeps: u32,
    /// Bodies whose renderer state was updated.
    pub synced: usize,
    /// Bodies skipped this frame, with the reason.
    pub skipped: Vec<SkippedBody>,
}

impl StepReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Synchronizes rigid-body state from a [`PhysicsWorld`] into a [`RenderScene`].
///
/// The bridge owns both collaborators, the table of tracked bodies, and each
/// body's smoothed velocity.
///
/// # Example
///
/// ```ignore
/// let mut bridge = PoseSyncBridge::new(physics, scene);
/// let handle = bridge.track(RigidBody::new(body, entity))?;
/// for frame in 0..300 {
///     bridge.step(0.01, 30.0)?;
///     bridge.render_frame(format!("outf/{frame:05}.png"))?;
/// }
/// ```
pub struct PoseSyncBridge<P: PhysicsWorld, R: RenderScene> {
    physics: P,
    scene: R,
    bodies: RigidBodySet<P::BodyId, R::EntityId>,
    config: BridgeConfig,
    frame: u64,
}

impl<P: PhysicsWorld, R: RenderScene> PoseSyncBridge<P, R> {
    /// Creates a bridge with [`BridgeConfig::default`].
    pub fn new(physics: P, scene: R) -> Self {
        Self::with_config(physics, scene, BridgeConfig::default())
    }

    pub fn with_config(physics: P, scene: R, config: BridgeConfig) -> Self {
        Self {
            physics,
            scene,
            bodies: RigidBodySet::new(),
            config,
            frame: 0,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn scene(&self) -> &R {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut R {
        &mut self.scene
    }

    /// Number of frames produced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Consumes the bridge, returning the physics world and render scene.
    pub fn into_parts(self) -> (P, R) {
        (self.physics, self.scene)
    }

    /// Starts tracking a body. Its smoothed velocity starts at rest.
    pub fn track(
        &mut self,
        body: RigidBody<P::BodyId, R::EntityId>,
    ) -> Result<RigidBodyHandle, BridgeError> {
        let handle = self
            .bodies
            .insert(body, VelocitySmoother::new(self.config.mix))?;
        log::debug!(
            "tracking physics body {:?} as render entity {:?}",
            body.physics_id,
            body.render_id
        );
        Ok(handle)
    }

    /// Stops tracking a body and drops its velocity history.
    pub fn untrack(
        &mut self,
        handle: RigidBodyHandle,
    ) -> Option<RigidBody<P::BodyId, R::EntityId>> {
        self.bodies.remove(handle)
    }

    pub fn get(&self, handle: RigidBodyHandle) -> Option<&RigidBody<P::BodyId, R::EntityId>> {
        self.bodies.get(handle).map(|tracked| &tracked.body)
    }

    /// Smoothed velocity state of a tracked body.
    pub fn smoothed_velocity(&self, handle: RigidBodyHandle) -> Option<&VelocitySmoother> {
        self.bodies.get(handle).map(|tracked| &tracked.velocity)
    }

    pub fn handle_for_physics_id(&self, id: &P::BodyId) -> Option<RigidBodyHandle> {
        self.bodies.handle_for_physics_id(id)
    }

    pub fn handle_for_render_id(&self, id: &R::EntityId) -> Option<RigidBodyHandle> {
        self.bodies.handle_for_render_id(id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advances physics by one frame and synchronizes every tracked body.
    ///
    /// Runs `ceil((1 / seconds_per_step) / frames_per_second)` physics steps,
    /// then writes position, rotation, and smoothed per-frame velocities into
    /// the renderer. A body whose ids no longer resolve, or whose state cannot
    /// be converted, is logged and skipped for this frame; its velocity
    /// history is kept. Engine failures abort the step.
    pub fn step(
        &mut self,
        seconds_per_step: Real,
        frames_per_second: Real,
    ) -> Result<StepReport, BridgeError> {
        profile_scope!("bridge: step");

        let substeps =
            steps_per_frame(seconds_per_step, frames_per_second).map_err(BridgeError::Timing)?;

        self.physics.set_time_step(seconds_per_step)?;
        for _ in 0..substeps {
            self.physics.step_simulation()?;
        }

        let mut report = StepReport {
            frame: self.frame,
            substeps,
            ..Default::default()
        };

        for (handle, tracked) in self.bodies.iter_mut() {
            match sync_body(&self.physics, &mut self.scene, tracked, frames_per_second) {
                Ok(()) => report.synced += 1,
                Err(BodyFailure::Skip(error)) => {
                    log::warn!(
                        "frame {}: skipping rigid body {:?}: {error}",
                        report.frame,
                        handle
                    );
                    report.skipped.push(SkippedBody { handle, error });
                }
                Err(BodyFailure::Fatal(err)) => return Err(err),
            }
        }

        self.frame += 1;
        profile_plot!("bridge: skipped bodies", report.skipped.len());
        log::debug!(
            "frame {}: {} sub-steps, {} synced, {} skipped",
            report.frame,
            report.substeps,
            report.synced,
            report.skipped.len()
        );
        Ok(report)
    }

    /// [`step`](Self::step) with the configured timing.
    pub fn step_frame(&mut self) -> Result<StepReport, BridgeError> {
        self.step(self.config.seconds_per_step, self.config.frames_per_second)
    }

    /// Renders the current scene with the configured resolution and sample count.
    pub fn render_frame(&mut self, path: impl AsRef<Path>) -> Result<(), BridgeError> {
        profile_scope!("bridge: render_frame");
        let BridgeConfig {
            width,
            height,
            samples_per_pixel,
            ..
        } = self.config;
        self.scene
            .render_to_image(width, height, samples_per_pixel, path.as_ref())?;
        Ok(())
    }

    /// Moves a tracked body's physics state to a new pose and forgets its
    /// velocity history.
    ///
    /// `rotation` is the scalar-first rotation the renderer should show. The
    /// body's base rotation is divided out before it is written to physics.
    /// The renderer is updated on the next [`step`](Self::step).
    pub fn teleport(
        &mut self,
        handle: RigidBodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), BridgeError> {
        let tracked = self
            .bodies
            .get_mut(handle)
            .ok_or(BridgeError::StaleHandle(handle))?;

        let orientation = physics_orientation(quat_wxyz_to_xyzw(&rotation))
            .map_err(|err| BridgeError::Sync(SyncError::Conversion(err)))?;
        let orientation = orientation * tracked.body.base_rotation.inverse();
        let pose = BodyPose::new(
            vec3_to_real(position),
            quat_wxyz_to_xyzw(orientation.quaternion()),
        );

        match self.physics.reset_base_pose(tracked.body.physics_id, &pose) {
            Ok(()) => {}
            Err(PhysicsError::UnknownBody(id)) => {
                return Err(BridgeError::Sync(SyncError::UnknownBody(id)));
            }
            Err(err) => return Err(err.into()),
        }
        tracked.velocity.reset();
        Ok(())
    }
}

/// Copies one body's state from physics into the renderer.
///
/// The smoother is only advanced once every renderer write succeeded.
fn sync_body<P: PhysicsWorld, R: RenderScene>(
    physics: &P,
    scene: &mut R,
    tracked: &mut TrackedBody<P::BodyId, R::EntityId>,
    frames_per_second: Real,
) -> Result<(), BodyFailure> {
    let body = tracked.body;
    let pose = physics.base_pose(body.physics_id)?;
    let velocity = physics.base_velocity(body.physics_id)?;

    let position = finite_vector(&pose.position, "position")?;
    let linear = finite_vector(&velocity.linear, "linear velocity")?;
    let angular = finite_vector(&velocity.angular, "angular velocity")?;
    let rotation = physics_orientation(pose.orientation)? * body.base_rotation;

    let mut smoother = tracked.velocity;
    let (linear, angular) = smoother.update(
        &linear_velocity_per_frame(&linear, frames_per_second),
        &angular_velocity_per_frame(&angular, frames_per_second),
    );

    let entity = body.render_id;
    scene.set_position(entity, vec3_from_real(&position))?;
    scene.set_rotation(entity, rotation.into_inner())?;
    scene.set_linear_velocity(entity, linear, PER_FRAME, NO_MIX)?;
    scene.set_angular_velocity(entity, angular, PER_FRAME, NO_MIX)?;

    tracked.velocity = smoother;
    Ok(())
}
