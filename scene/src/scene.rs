//! The motion scene: entities, camera and output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use posebridge::{RenderError, RenderScene};
use posebridge_core::math::{Quat, Vec3};
use posebridge_core::profile_scope;

use crate::camera::Camera;
use crate::entity::{EntityAllocator, EntityId};
use crate::raster::{Hit, rasterize, render_radiance, to_rgb8};
use crate::transform::MotionTransform;

/// Geometry of a [`SceneEntity`], scaled by its half extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Box,
    /// Ellipsoid with the half extents as radii.
    Sphere,
}

/// A renderable with a motion transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub name: String,
    pub transform: MotionTransform,
    pub shape: Shape,
    /// Linear RGB in `[0, 1]`.
    pub color: Vec3,
    pub half_extents: Vec3,
}

impl SceneEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: MotionTransform::default(),
            shape: Shape::Box,
            color: Vec3::new(0.8, 0.8, 0.8),
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }

    #[must_use]
    pub fn with_transform(mut self, transform: MotionTransform) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_half_extents(mut self, half_extents: Vec3) -> Self {
        self.half_extents = half_extents;
        self
    }
}

/// Auxiliary per-pixel buffers returned by [`MotionScene::render_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Distance along the camera axis.
    Depth,
    /// Slot index of the visible entity.
    EntityId,
    /// World-space position of the visible surface.
    Position,
    /// World-space unit normal of the visible surface.
    Normal,
}

/// An in-memory scene of moving boxes and spheres with a preview renderer.
///
/// Velocity writes follow the renderer convention described on
/// [`RenderScene`]. After [`cleanup`](Self::cleanup) every operation returns
/// [`RenderError::NotInitialized`].
#[derive(Debug)]
pub struct MotionScene {
    allocator: EntityAllocator,
    slots: Vec<Option<SceneEntity>>,
    camera: Camera,
    background: Vec3,
    initialized: bool,
}

impl Default for MotionScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionScene {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::default(),
            slots: Vec::new(),
            camera: Camera::default(),
            background: Vec3::new(0.1, 0.1, 0.1),
            initialized: true,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Releases all entities. The scene cannot be used afterwards.
    pub fn cleanup(&mut self) {
        if self.initialized {
            log::info!("cleaning up scene with {} entities", self.len());
        }
        self.allocator.clear();
        self.slots.clear();
        self.initialized = false;
    }

    fn ensure_initialized(&self) -> Result<(), RenderError> {
        if self.initialized {
            Ok(())
        } else {
            Err(RenderError::NotInitialized)
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn background(&self) -> Vec3 {
        self.background
    }

    pub fn set_background(&mut self, color: Vec3) {
        self.background = color;
    }

    pub fn spawn(&mut self, entity: SceneEntity) -> Result<EntityId, RenderError> {
        self.ensure_initialized()?;
        let id = self.allocator.allocate();
        let index = id.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        log::trace!("spawned {id} '{}'", entity.name);
        self.slots[index] = Some(entity);
        Ok(id)
    }

    pub fn despawn(&mut self, id: EntityId) -> Result<SceneEntity, RenderError> {
        self.ensure_initialized()?;
        if !self.allocator.deallocate(id) {
            return Err(unknown(id));
        }
        self.slots[id.index() as usize]
            .take()
            .ok_or_else(|| unknown(id))
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneEntity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    /// First entity with the given name.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.iter()
            .find(|(_, entity)| entity.name == name)
            .map(|(id, _)| id)
    }

    /// Live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &SceneEntity)> + Clone {
        let allocator = &self.allocator;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            let entity = slot.as_ref()?;
            let id = allocator.id_at(index as u32)?;
            Some((id, entity))
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut SceneEntity, RenderError> {
        self.ensure_initialized()?;
        self.get_mut(id).ok_or_else(|| unknown(id))
    }

    /// The entity's transform.
    pub fn transform(&self, id: EntityId) -> Result<&MotionTransform, RenderError> {
        self.ensure_initialized()?;
        self.get(id)
            .map(|entity| &entity.transform)
            .ok_or_else(|| unknown(id))
    }

    /// Sets how fast the entity grows per second; blended like the other
    /// velocities.
    pub fn set_scalar_velocity(
        &mut self,
        id: EntityId,
        velocity: Vec3,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError> {
        self.entity_mut(id)?
            .transform
            .set_scalar_velocity(velocity, frames_per_second, mix);
        Ok(())
    }

    /// Renders the motion-blurred preview without writing it anywhere.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
    ) -> Result<image::RgbImage, RenderError> {
        self.ensure_initialized()?;
        check_dimensions(width, height)?;
        profile_scope!("scene: render");

        let radiance = render_radiance(
            self.iter(),
            &self.camera,
            &self.background,
            width,
            height,
            samples_per_pixel,
        );
        image::RgbImage::from_raw(width, height, to_rgb8(&radiance))
            .ok_or_else(|| RenderError::Image("pixel buffer does not match image size".into()))
    }

    /// Renders the motion-blurred preview as unclamped linear RGB.
    pub fn render_hdr(
        &self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
    ) -> Result<image::Rgb32FImage, RenderError> {
        self.ensure_initialized()?;
        check_dimensions(width, height)?;
        profile_scope!("scene: render_hdr");

        let radiance = render_radiance(
            self.iter(),
            &self.camera,
            &self.background,
            width,
            height,
            samples_per_pixel,
        );
        let raw = radiance.iter().flat_map(|c| [c.x, c.y, c.z]).collect();
        image::Rgb32FImage::from_raw(width, height, raw)
            .ok_or_else(|| RenderError::Image("pixel buffer does not match image size".into()))
    }

    /// Writes [`render_hdr`](Self::render_hdr) to `path` as a Radiance HDR file.
    pub fn render_to_hdr(
        &self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
        path: &Path,
    ) -> Result<(), RenderError> {
        let image = self.render_hdr(width, height, samples_per_pixel)?;
        let file = BufWriter::new(File::create(path)?);
        let pixels: Vec<image::Rgb<f32>> = image.pixels().copied().collect();
        image::codecs::hdr::HdrEncoder::new(file)
            .encode(&pixels, width as usize, height as usize)
            .map_err(image_error)?;
        log::debug!(
            "wrote {width}x{height} HDR image ({samples_per_pixel} spp) to {}",
            path.display()
        );
        Ok(())
    }

    /// Renders an auxiliary buffer as row-major RGBA `f32` values.
    ///
    /// Values are taken at shutter open from the nearest surface. Pixels that
    /// see no entity are all zero, including alpha; covered pixels have an
    /// alpha of 1.
    pub fn render_data(
        &self,
        width: u32,
        height: u32,
        kind: DataKind,
    ) -> Result<Vec<f32>, RenderError> {
        self.ensure_initialized()?;
        check_dimensions(width, height)?;
        profile_scope!("scene: render_data");

        let hits = rasterize(self.iter(), &self.camera, width, height, 0.0);
        let mut data = Vec::with_capacity(hits.len() * 4);
        for hit in hits {
            let texel = match hit {
                None => [0.0; 4],
                Some(Hit { depth, .. }) if kind == DataKind::Depth => [depth, depth, depth, 1.0],
                Some(Hit { entity, .. }) if kind == DataKind::EntityId => {
                    let id = entity.index() as f32;
                    [id, id, id, 1.0]
                }
                Some(Hit { normal: n, .. }) if kind == DataKind::Normal => [n.x, n.y, n.z, 1.0],
                Some(Hit { position: p, .. }) => [p.x, p.y, p.z, 1.0],
            };
            data.extend_from_slice(&texel);
        }
        Ok(data)
    }
}

fn unknown(id: EntityId) -> RenderError {
    RenderError::UnknownEntity(id.to_string())
}

fn image_error(err: image::ImageError) -> RenderError {
    match err {
        image::ImageError::IoError(io) => RenderError::Io(io),
        other => RenderError::Image(other.to_string()),
    }
}

/// Rejects empty images and sizes whose RGBA buffers do not fit in memory.
fn check_dimensions(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::Image(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    let fits = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(4))
        .is_some();
    if !fits {
        return Err(RenderError::Image(format!(
            "image dimensions {width}x{height} are too large"
        )));
    }
    Ok(())
}

impl RenderScene for MotionScene {
    type EntityId = EntityId;

    fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<(), RenderError> {
        self.entity_mut(id)?.transform.position = position;
        Ok(())
    }

    fn set_rotation(&mut self, id: EntityId, rotation: Quat) -> Result<(), RenderError> {
        self.entity_mut(id)?.transform.set_rotation(rotation);
        Ok(())
    }

    fn set_linear_velocity(
        &mut self,
        id: EntityId,
        velocity: Vec3,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError> {
        self.entity_mut(id)?
            .transform
            .set_linear_velocity(velocity, frames_per_second, mix);
        Ok(())
    }

    fn set_angular_velocity(
        &mut self,
        id: EntityId,
        velocity: Quat,
        frames_per_second: f32,
        mix: f32,
    ) -> Result<(), RenderError> {
        self.entity_mut(id)?
            .transform
            .set_angular_velocity(velocity, frames_per_second, mix);
        Ok(())
    }

    fn render_to_image(
        &mut self,
        width: u32,
        height: u32,
        samples_per_pixel: u32,
        path: &Path,
    ) -> Result<(), RenderError> {
        let image = self.render(width, height, samples_per_pixel)?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(image_error)?;
        log::debug!(
            "wrote {width}x{height} image ({samples_per_pixel} spp) to {}",
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_get_despawn() {
        let mut scene = MotionScene::new();
        let a = scene.spawn(SceneEntity::new("mesh_0")).unwrap();
        let b = scene.spawn(SceneEntity::new("mesh_1")).unwrap();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find("mesh_1"), Some(b));

        let removed = scene.despawn(a).unwrap();
        assert_eq!(removed.name, "mesh_0");
        assert!(scene.get(a).is_none());
        assert!(matches!(scene.despawn(a), Err(RenderError::UnknownEntity(_))));

        let c = scene.spawn(SceneEntity::new("mesh_2")).unwrap();
        assert_eq!(c.index(), a.index());
        assert!(scene.get(a).is_none());
        assert_eq!(scene.get(c).unwrap().name, "mesh_2");
    }

    #[test]
    fn stale_id_is_unknown_entity() {
        let mut scene = MotionScene::new();
        let a = scene.spawn(SceneEntity::new("mesh_0")).unwrap();
        scene.despawn(a).unwrap();
        let err = scene.set_position(a, Vec3::zeros()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownEntity(name) if name == "Entity(0@0)"));
    }

    #[test]
    fn cleanup_rejects_everything() {
        let mut scene = MotionScene::new();
        let a = scene.spawn(SceneEntity::new("mesh_0")).unwrap();
        scene.cleanup();

        assert!(!scene.is_initialized());
        assert!(scene.is_empty());
        assert!(matches!(
            scene.set_rotation(a, Quat::identity()),
            Err(RenderError::NotInitialized)
        ));
        assert!(matches!(
            scene.spawn(SceneEntity::new("x")),
            Err(RenderError::NotInitialized)
        ));
        assert!(matches!(
            scene.render_data(4, 4, DataKind::Depth),
            Err(RenderError::NotInitialized)
        ));
    }

    #[test]
    fn setters_apply_renderer_velocity_rules() {
        let mut scene = MotionScene::new();
        let a = scene.spawn(SceneEntity::new("mesh_0")).unwrap();
        scene
            .set_linear_velocity(a, Vec3::new(0.0, 0.0, -3.0), 30.0, 0.0)
            .unwrap();
        scene
            .set_angular_velocity(a, Quat::new(1.0, 3.0, 0.0, 0.0), 30.0, 0.5)
            .unwrap();
        scene
            .set_scalar_velocity(a, Vec3::new(1.0, 1.0, 1.0), 10.0, 0.0)
            .unwrap();

        let t = scene.transform(a).unwrap();
        assert!((t.linear_velocity.z - (-0.1)).abs() < 1e-7);
        assert!((t.angular_velocity.i - 0.05).abs() < 1e-7);
        assert!((t.angular_velocity.w - 1.0).abs() < 1e-7);
        assert!((t.scalar_velocity.x - 0.1).abs() < 1e-7);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let scene = MotionScene::new();
        assert!(matches!(scene.render(0, 10, 1), Err(RenderError::Image(_))));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let scene = MotionScene::new();
        assert!(matches!(
            scene.render(u32::MAX, 2, 1),
            Err(RenderError::Image(_))
        ));
        assert!(matches!(
            scene.render_data(65_536, 65_536, DataKind::Depth),
            Err(RenderError::Image(_))
        ));
        assert!(matches!(
            scene.render_hdr(40_000, 40_000, 1),
            Err(RenderError::Image(_))
        ));
    }

    #[test]
    fn shape_defaults_to_box() {
        let entity = SceneEntity::new("mesh_0");
        assert_eq!(entity.shape, Shape::Box);
        assert_eq!(entity.with_shape(Shape::Sphere).shape, Shape::Sphere);
    }
}
