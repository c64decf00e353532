//! Pinhole camera used by the preview renderer.

use posebridge_core::math::{Mat4, Vec3, Vec4, look_at_rh, perspective_rh};

/// A perspective camera looking from `eye` towards `target`, z-up by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(10.0, 0.0, 5.0),
            target: Vec3::new(0.0, 0.0, 0.0),
            up: Vec3::z(),
            fov_y: 0.785_398,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// A world point projected onto the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: u32,
    pub y: u32,
    /// Distance along the view axis.
    pub depth: f32,
}

impl Camera {
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        Self {
            eye,
            target,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_fov_y(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y;
        self
    }

    pub fn view(&self) -> Mat4 {
        look_at_rh(&self.eye, &self.target, &self.up)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        perspective_rh(self.fov_y, aspect, self.near, self.far) * self.view()
    }

    /// Projects a world-space point to a pixel of a `width` x `height` image.
    ///
    /// Returns `None` for points behind the camera, outside the depth range, or
    /// outside the image.
    pub fn project(
        &self,
        view_projection: &Mat4,
        point: &Vec3,
        width: u32,
        height: u32,
    ) -> Option<Projected> {
        let clip = view_projection * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            return None;
        }
        let px = (ndc.x + 1.0) * 0.5 * width as f32;
        let py = (1.0 - ndc.y) * 0.5 * height as f32;
        if px < 0.0 || py < 0.0 || px >= width as f32 || py >= height as f32 {
            return None;
        }
        Some(Projected {
            x: px as u32,
            y: py as u32,
            depth: clip.w,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_image_center() {
        let camera = Camera::default();
        let vp = camera.view_projection(1.0);
        let p = camera.project(&vp, &camera.target, 100, 100).unwrap();
        assert!((49..=50).contains(&p.x) && (49..=50).contains(&p.y));
        let distance = (camera.eye - camera.target).norm();
        assert!((p.depth - distance).abs() < 1e-3);
    }

    #[test]
    fn up_is_up_in_the_image() {
        let camera = Camera::looking_at(Vec3::new(10.0, 0.0, 0.0), Vec3::zeros());
        let vp = camera.view_projection(1.0);
        let above = camera.project(&vp, &Vec3::new(0.0, 0.0, 1.0), 100, 100).unwrap();
        assert!(above.y < 50);
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let camera = Camera::looking_at(Vec3::new(10.0, 0.0, 0.0), Vec3::zeros());
        let vp = camera.view_projection(1.0);
        assert!(camera.project(&vp, &Vec3::new(20.0, 0.0, 0.0), 100, 100).is_none());
        assert!(camera.project(&vp, &Vec3::new(0.0, 0.0, 100.0), 100, 100).is_none());
    }
}
