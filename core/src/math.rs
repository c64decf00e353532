//! Math type aliases and helper functions.
//!
//! Rendering types are always `f32`. Physics types use [`Real`] (`f64`), the
//! precision rapier reports body state in.

pub use nalgebra;

// ===== Rendering math (always f32) =====

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Scalar-first when constructed with `Quaternion::new(w, x, y, z)`.
/// Use [`quat_from_xyzw`] to build one from vector-first components.
pub type Quat = nalgebra::Quaternion<f32>;

/// Unit quaternion (f32).
pub type UnitQuat = nalgebra::UnitQuaternion<f32>;

// ===== Physics math (f64) =====

/// Physics scalar type.
pub type Real = f64;

/// 3D physics vector.
pub type Vector3 = nalgebra::Vector3<Real>;

// ===== Helper functions =====

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = nalgebra::UnitQuaternion::new_unchecked(rotation);
    let m = r.to_rotation_matrix();
    let rm = m.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Build a right-handed perspective projection with depth range [0, 1].
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Right-handed look-at view matrix.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::look_at_rh(&eye_point, &target_point, up).to_homogeneous()
}

/// Create a quaternion from x, y, z, w components.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    nalgebra::Quaternion::new(w, x, y, z)
}

/// Create a quaternion from rotation around the X axis.
pub fn quat_from_rotation_x(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), angle).into_inner()
}

/// Create a quaternion from rotation around the Z axis.
pub fn quat_from_rotation_z(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), angle).into_inner()
}

/// Converts a physics `Vector3<Real>` to a rendering `Vec3` (f32).
pub fn vec3_from_real(v: &Vector3) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Converts a rendering `Vec3` (f32) to a physics `Vector3<Real>`.
pub fn vec3_to_real(v: Vec3) -> Vector3 {
    Vector3::new(v.x as Real, v.y as Real, v.z as Real)
}
