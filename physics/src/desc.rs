//! Rigid body and collider descriptors.
//!
//! Descriptors are plain data describing what to create. Pass them to
//! [`RapierWorld::spawn`](crate::RapierWorld::spawn) to materialize the
//! corresponding rapier objects.

use posebridge::{BodyPose, BodyVelocity};
use posebridge_core::math::{Real, Vector3};
use rapier3d_f64::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d_f64::prelude::*;

/// Collider shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    /// Sphere defined by radius.
    Ball { radius: Real },
    /// Box defined by half extents along each axis.
    Cuboid { half_extents: Vector3 },
}

/// Half extent of the ground slab along `x` and `y`.
pub const GROUND_HALF_EXTENT: Real = 50.0;

/// Half thickness of the ground slab.
pub const GROUND_HALF_THICKNESS: Real = 0.5;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// Affected by forces and gravity.
    #[default]
    Dynamic,
    /// Immovable (infinite mass).
    Fixed,
}

/// Describes a rigid body's type, initial state and damping.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    /// Initial pose; orientation in `[x, y, z, w]` order.
    pub pose: BodyPose,
    /// Initial velocity.
    pub velocity: BodyVelocity,
    pub linear_damping: Real,
    pub angular_damping: Real,
    /// Gravity multiplier (1.0 = normal, 0.0 = no gravity).
    pub gravity_scale: Real,
}

impl BodyDesc {
    pub fn dynamic() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Self::default()
        }
    }

    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Fixed,
            ..Self::default()
        }
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.pose.position = position;
        self
    }

    /// Sets the orientation from an `[x, y, z, w]` quaternion.
    pub fn with_orientation(mut self, xyzw: [Real; 4]) -> Self {
        self.pose.orientation = xyzw;
        self
    }

    pub fn with_linear_velocity(mut self, v: Vector3) -> Self {
        self.velocity.linear = v;
        self
    }

    pub fn with_angular_velocity(mut self, v: Vector3) -> Self {
        self.velocity.angular = v;
        self
    }

    pub fn with_linear_damping(mut self, v: Real) -> Self {
        self.linear_damping = v;
        self
    }

    pub fn with_angular_damping(mut self, v: Real) -> Self {
        self.angular_damping = v;
        self
    }

    pub fn with_gravity_scale(mut self, v: Real) -> Self {
        self.gravity_scale = v;
        self
    }

    /// Convert this descriptor into a rapier `RigidBody`.
    pub(crate) fn to_rigid_body(&self) -> RigidBody {
        let builder = match self.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        };

        let v = &self.velocity;
        builder
            .position(isometry_from_pose(&self.pose))
            .linvel(vector![v.linear.x, v.linear.y, v.linear.z])
            .angvel(vector![v.angular.x, v.angular.y, v.angular.z])
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .gravity_scale(self.gravity_scale)
            .build()
    }
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            pose: BodyPose::new(Vector3::zeros(), [0.0, 0.0, 0.0, 1.0]),
            velocity: BodyVelocity::zero(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
        }
    }
}

/// Describes a collider's shape and material properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderDesc {
    pub shape: ShapeDesc,
    pub friction: Real,
    /// Restitution (bounciness, 0.0–1.0).
    pub restitution: Real,
    /// Mass density. Ignored when `mass` is set.
    pub density: Real,
    /// Total mass of the collider.
    pub mass: Option<Real>,
    /// Translation of the shape relative to its body.
    pub offset: Vector3,
}

impl ColliderDesc {
    pub fn ball(radius: Real) -> Self {
        Self {
            shape: ShapeDesc::Ball { radius },
            ..Self::default()
        }
    }

    pub fn cuboid(hx: Real, hy: Real, hz: Real) -> Self {
        Self {
            shape: ShapeDesc::Cuboid {
                half_extents: Vector3::new(hx, hy, hz),
            },
            ..Self::default()
        }
    }

    /// A wide slab whose top face lies at `z = 0` of its body.
    pub fn ground() -> Self {
        Self::cuboid(GROUND_HALF_EXTENT, GROUND_HALF_EXTENT, GROUND_HALF_THICKNESS)
            .with_offset(Vector3::new(0.0, 0.0, -GROUND_HALF_THICKNESS))
    }

    pub fn with_offset(mut self, offset: Vector3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_friction(mut self, v: Real) -> Self {
        self.friction = v;
        self
    }

    pub fn with_restitution(mut self, v: Real) -> Self {
        self.restitution = v;
        self
    }

    pub fn with_density(mut self, v: Real) -> Self {
        self.density = v;
        self
    }

    pub fn with_mass(mut self, v: Real) -> Self {
        self.mass = Some(v);
        self
    }

    /// Convert this descriptor into a rapier `Collider`.
    pub(crate) fn to_collider(&self) -> Collider {
        let builder = match &self.shape {
            ShapeDesc::Ball { radius } => ColliderBuilder::ball(*radius),
            ShapeDesc::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        };

        let o = &self.offset;
        let builder = builder
            .translation(vector![o.x, o.y, o.z])
            .friction(self.friction)
            .restitution(self.restitution);
        match self.mass {
            Some(mass) => builder.mass(mass),
            None => builder.density(self.density),
        }
        .build()
    }
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ShapeDesc::Ball { radius: 0.5 },
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
            mass: None,
            offset: Vector3::zeros(),
        }
    }
}

/// Builds a rapier isometry from a pose; the orientation is normalized.
pub(crate) fn isometry_from_pose(pose: &BodyPose) -> Isometry3<Real> {
    let p = &pose.position;
    let [x, y, z, w] = pose.orientation;
    Isometry3::from_parts(
        Translation3::new(p.x, p.y, p.z),
        UnitQuaternion::new_normalize(Quaternion::new(w, x, y, z)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_constructors() {
        assert_eq!(BodyDesc::dynamic().kind, BodyKind::Dynamic);
        assert_eq!(BodyDesc::fixed().kind, BodyKind::Fixed);
        assert_eq!(BodyDesc::default().pose.orientation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn body_builder_pattern() {
        let desc = BodyDesc::dynamic()
            .with_position(Vector3::new(1.0, 2.0, 3.0))
            .with_linear_velocity(Vector3::new(0.0, 0.0, -1.0))
            .with_linear_damping(0.5)
            .with_angular_damping(0.3)
            .with_gravity_scale(2.0);
        assert_eq!(desc.pose.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(desc.velocity.linear.z, -1.0);
        assert_eq!(desc.linear_damping, 0.5);
        assert_eq!(desc.angular_damping, 0.3);
        assert_eq!(desc.gravity_scale, 2.0);
    }

    #[test]
    fn rigid_body_keeps_pose_and_velocity() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let body = BodyDesc::dynamic()
            .with_position(Vector3::new(0.0, 0.0, 4.0))
            .with_orientation([0.0, 0.0, half, half])
            .with_angular_velocity(Vector3::new(0.0, 0.0, 2.0))
            .to_rigid_body();

        assert!(body.is_dynamic());
        assert_eq!(body.translation().z, 4.0);
        assert!((body.rotation().k - half).abs() < 1e-12);
        assert_eq!(body.angvel().z, 2.0);
    }

    #[test]
    fn collider_constructors() {
        assert!(matches!(ColliderDesc::ball(1.0).shape, ShapeDesc::Ball { radius } if radius == 1.0));
        assert!(matches!(
            ColliderDesc::cuboid(1.0, 2.0, 3.0).shape,
            ShapeDesc::Cuboid { half_extents } if half_extents == Vector3::new(1.0, 2.0, 3.0)
        ));
    }

    #[test]
    fn ground_top_face_is_at_zero() {
        let ground = ColliderDesc::ground();
        assert!(matches!(ground.shape, ShapeDesc::Cuboid { .. }));

        let aabb = ground.to_collider().compute_aabb();
        assert!(aabb.maxs.z.abs() < 1e-9);
        assert!((aabb.mins.z + 2.0 * GROUND_HALF_THICKNESS).abs() < 1e-9);
        assert!(aabb.maxs.x >= GROUND_HALF_EXTENT - 1e-9);
    }

    #[test]
    fn explicit_mass_wins_over_density() {
        let collider = ColliderDesc::cuboid(0.5, 0.5, 0.5)
            .with_density(100.0)
            .with_mass(2.0)
            .to_collider();
        assert!((collider.mass() - 2.0).abs() < 1e-9);

        let collider = ColliderDesc::cuboid(0.5, 0.5, 0.5).with_density(3.0).to_collider();
        assert!((collider.mass() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn collider_material() {
        let collider = ColliderDesc::ball(0.5)
            .with_friction(0.8)
            .with_restitution(0.3)
            .to_collider();
        assert_eq!(collider.friction(), 0.8);
        assert_eq!(collider.restitution(), 0.3);
    }
}
