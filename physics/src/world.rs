//! Rapier-backed [`PhysicsWorld`].

use posebridge::{BodyPose, BodyVelocity, PhysicsError, PhysicsWorld};
use posebridge_core::math::{Real, Vector3};
use rapier3d_f64::prelude::*;

use crate::desc::{BodyDesc, ColliderDesc, isometry_from_pose};

/// All rapier 3D pipeline state.
pub struct PhysicsState {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
}

impl PhysicsState {
    fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    fn step(&mut self) {
        posebridge_core::profile_scope!("rapier3d: step");
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn body(&self, handle: RigidBodyHandle) -> Result<&RigidBody, PhysicsError> {
        self.bodies
            .get(handle)
            .ok_or_else(|| PhysicsError::UnknownBody(format!("{handle:?}")))
    }
}

/// A rapier3d simulation, z-up.
///
/// Bodies are addressed by rapier [`RigidBodyHandle`]s. After
/// [`disconnect`](Self::disconnect) every operation fails with
/// [`PhysicsError::NotConnected`].
///
/// # Example
///
/// ```ignore
/// let mut world = RapierWorld::new();
/// world.spawn(&BodyDesc::fixed(), &ColliderDesc::ground())?;
/// let ball = world.spawn(
///     &BodyDesc::dynamic().with_position(Vector3::new(0.0, 0.0, 5.0)),
///     &ColliderDesc::ball(0.5),
/// )?;
/// ```
pub struct RapierWorld {
    state: Option<PhysicsState>,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierWorld {
    /// Standard gravity of the z-up scenes, in m/s².
    pub const DEFAULT_GRAVITY: [Real; 3] = [0.0, 0.0, -10.0];

    /// Creates a world with [`DEFAULT_GRAVITY`](Self::DEFAULT_GRAVITY).
    pub fn new() -> Self {
        let [x, y, z] = Self::DEFAULT_GRAVITY;
        Self::with_gravity(Vector3::new(x, y, z))
    }

    /// Creates a new physics world with the given gravity.
    pub fn with_gravity(gravity: Vector3) -> Self {
        Self {
            state: Some(PhysicsState::new(vector![gravity.x, gravity.y, gravity.z])),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_some()
    }

    /// Drops all simulation state.
    pub fn disconnect(&mut self) {
        if self.state.take().is_some() {
            log::info!("physics world disconnected");
        }
    }

    /// Raw rapier state, if connected.
    pub fn state(&self) -> Option<&PhysicsState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut PhysicsState> {
        self.state.as_mut()
    }

    fn connected(&self) -> Result<&PhysicsState, PhysicsError> {
        self.state.as_ref().ok_or(PhysicsError::NotConnected)
    }

    fn connected_mut(&mut self) -> Result<&mut PhysicsState, PhysicsError> {
        self.state.as_mut().ok_or(PhysicsError::NotConnected)
    }

    /// Current integration step length in seconds.
    pub fn time_step(&self) -> Result<Real, PhysicsError> {
        Ok(self.connected()?.integration_parameters.dt)
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.bodies.len())
    }

    /// Creates a rigid body with one attached collider and returns its handle.
    pub fn spawn(
        &mut self,
        body: &BodyDesc,
        collider: &ColliderDesc,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        let state = self.connected_mut()?;
        let handle = state.bodies.insert(body.to_rigid_body());
        state
            .colliders
            .insert_with_parent(collider.to_collider(), handle, &mut state.bodies);
        log::trace!("spawned {:?} body {handle:?}", body.kind);
        Ok(handle)
    }

    /// Removes a body together with its colliders.
    pub fn remove(&mut self, handle: RigidBodyHandle) -> Result<(), PhysicsError> {
        let state = self.connected_mut()?;
        state
            .bodies
            .remove(
                handle,
                &mut state.island_manager,
                &mut state.colliders,
                &mut state.impulse_joints,
                &mut state.multibody_joints,
                true,
            )
            .map(|_| ())
            .ok_or_else(|| PhysicsError::UnknownBody(format!("{handle:?}")))
    }
}

impl PhysicsWorld for RapierWorld {
    type BodyId = RigidBodyHandle;

    fn set_time_step(&mut self, seconds_per_step: Real) -> Result<(), PhysicsError> {
        self.connected_mut()?.integration_parameters.dt = seconds_per_step;
        Ok(())
    }

    fn step_simulation(&mut self) -> Result<(), PhysicsError> {
        self.connected_mut()?.step();
        Ok(())
    }

    fn base_pose(&self, handle: RigidBodyHandle) -> Result<BodyPose, PhysicsError> {
        let position = self.connected()?.body(handle)?.position();
        let t = &position.translation.vector;
        let r = &position.rotation;
        Ok(BodyPose::new(
            Vector3::new(t.x, t.y, t.z),
            [r.i, r.j, r.k, r.w],
        ))
    }

    fn base_velocity(&self, handle: RigidBodyHandle) -> Result<BodyVelocity, PhysicsError> {
        let body = self.connected()?.body(handle)?;
        let (v, w) = (body.linvel(), body.angvel());
        Ok(BodyVelocity::new(
            Vector3::new(v.x, v.y, v.z),
            Vector3::new(w.x, w.y, w.z),
        ))
    }

    fn reset_base_pose(
        &mut self,
        handle: RigidBodyHandle,
        pose: &BodyPose,
    ) -> Result<(), PhysicsError> {
        let body = self
            .connected_mut()?
            .bodies
            .get_mut(handle)
            .ok_or_else(|| PhysicsError::UnknownBody(format!("{handle:?}")))?;
        body.set_position(isometry_from_pose(pose), true);
        Ok(())
    }
}
