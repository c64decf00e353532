//! Triangle rasterizer for the preview renderer.
//!
//! Each entity is tessellated into triangles that are clipped against the near
//! plane and scan-converted with a depth buffer, interpolating world position
//! perspective-correctly. For motion blur the shutter interval is sampled
//! `samples_per_pixel` times; every sample resolves visibility on its own and
//! contributes `1 / samples_per_pixel` of its color, so a moving entity leaves
//! a streak whose opacity falls off with its speed.

use posebridge_core::math::{Vec3, Vec4};

use crate::camera::Camera;
use crate::entity::EntityId;
use crate::scene::{SceneEntity, Shape};

const SPHERE_STACKS: u32 = 12;
const SPHERE_SLICES: u32 = 24;

/// Local-space triangles of a shape scaled by `half_extents`.
pub(crate) fn triangles(shape: Shape, half_extents: &Vec3) -> Vec<[Vec3; 3]> {
    match shape {
        Shape::Box => box_triangles(half_extents),
        Shape::Sphere => sphere_triangles(half_extents),
    }
}

fn box_triangles(half_extents: &Vec3) -> Vec<[Vec3; 3]> {
    let mut out = Vec::with_capacity(12);
    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        for side in [-1.0f32, 1.0] {
            let corner = |su: f32, sv: f32| {
                let mut p = Vec3::zeros();
                p[axis] = side;
                p[u] = su;
                p[v] = sv;
                p.component_mul(half_extents)
            };
            let quad = [
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ];
            out.push([quad[0], quad[1], quad[2]]);
            out.push([quad[0], quad[2], quad[3]]);
        }
    }
    out
}

fn sphere_triangles(radii: &Vec3) -> Vec<[Vec3; 3]> {
    let point = |stack: u32, slice: u32| {
        let theta = std::f32::consts::PI * stack as f32 / SPHERE_STACKS as f32;
        let phi = std::f32::consts::TAU * slice as f32 / SPHERE_SLICES as f32;
        Vec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        )
        .component_mul(radii)
    };

    let mut out = Vec::with_capacity((SPHERE_STACKS * SPHERE_SLICES * 2) as usize);
    for i in 0..SPHERE_STACKS {
        for j in 0..SPHERE_SLICES {
            let (a, b) = (point(i, j), point(i + 1, j));
            let (c, d) = (point(i + 1, j + 1), point(i, j + 1));
            // Pole rows collapse to a single triangle
            if i != 0 {
                out.push([a, b, d]);
            }
            if i + 1 != SPHERE_STACKS {
                out.push([b, c, d]);
            }
        }
    }
    out
}

/// Nearest surface seen through one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hit {
    pub depth: f32,
    pub entity: EntityId,
    pub position: Vec3,
    /// World-space unit normal, facing away from the entity's center.
    pub normal: Vec3,
    pub color: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    clip: Vec4,
    world: Vec3,
}

/// Per-triangle attributes shared by every pixel it covers.
struct Surface {
    entity: EntityId,
    normal: Vec3,
    color: Vec3,
}

/// Depth-tested coverage of every entity at shutter time `t`.
pub(crate) fn rasterize<'a>(
    entities: impl Iterator<Item = (EntityId, &'a SceneEntity)>,
    camera: &Camera,
    width: u32,
    height: u32,
    t: f32,
) -> Vec<Option<Hit>> {
    let view_projection = camera.view_projection(width as f32 / height as f32);
    let mut hits: Vec<Option<Hit>> = vec![None; width as usize * height as usize];

    for (id, entity) in entities {
        let model = entity.transform.local_to_world_at(t);
        let to_world = |p: &Vec3| (model * Vec4::new(p.x, p.y, p.z, 1.0)).xyz();
        let center = to_world(&Vec3::zeros());

        for triangle in triangles(entity.shape, &entity.half_extents) {
            let world = triangle.map(|p| to_world(&p));
            let Some(normal) = outward_normal(&world, &center) else {
                continue;
            };
            let surface = Surface {
                entity: id,
                normal,
                color: entity.color,
            };
            let vertices = world.map(|p| Vertex {
                clip: view_projection * Vec4::new(p.x, p.y, p.z, 1.0),
                world: p,
            });
            let polygon = clip_near(&vertices, camera.near);
            for k in 1..polygon.len().saturating_sub(1) {
                fill(
                    &mut hits,
                    width,
                    height,
                    [polygon[0], polygon[k], polygon[k + 1]],
                    &surface,
                );
            }
        }
    }
    hits
}

fn outward_normal(triangle: &[Vec3; 3], center: &Vec3) -> Option<Vec3> {
    let [a, b, c] = triangle;
    let n = (b - a).cross(&(c - a));
    let length = n.norm();
    if !length.is_finite() || length < 1e-12 {
        return None;
    }
    let n = n / length;
    let centroid = (a + b + c) / 3.0;
    Some(if n.dot(&(centroid - center)) < 0.0 { -n } else { n })
}

/// Clips a triangle to the half space in front of the near plane.
fn clip_near(triangle: &[Vertex; 3], near: f32) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let (a_in, b_in) = (a.clip.w >= near, b.clip.w >= near);
        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let s = (near - a.clip.w) / (b.clip.w - a.clip.w);
            out.push(Vertex {
                clip: a.clip.lerp(&b.clip, s),
                world: a.world.lerp(&b.world, s),
            });
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f64,
    y: f64,
    inv_w: f32,
    world_over_w: Vec3,
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, x: f64, y: f64) -> f64 {
    (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
}

/// Scan-converts one triangle, sampling at pixel centers.
fn fill(
    hits: &mut [Option<Hit>],
    width: u32,
    height: u32,
    triangle: [Vertex; 3],
    surface: &Surface,
) {
    let (w, h) = (width as f64, height as f64);
    let s = triangle.map(|v| {
        let inv_w = 1.0 / v.clip.w;
        ScreenVertex {
            x: (v.clip.x as f64 * inv_w as f64 + 1.0) * 0.5 * w,
            y: (1.0 - v.clip.y as f64 * inv_w as f64) * 0.5 * h,
            inv_w,
            world_over_w: v.world * inv_w,
        }
    });

    let area = edge(&s[0], &s[1], s[2].x, s[2].y);
    if !area.is_finite() || area.abs() < 1e-12 {
        return;
    }

    let min_x = s.iter().map(|v| v.x).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let min_y = s.iter().map(|v| v.y).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_x = s.iter().map(|v| v.x).fold(f64::NEG_INFINITY, f64::max).ceil().min(w);
    let max_y = s.iter().map(|v| v.y).fold(f64::NEG_INFINITY, f64::max).ceil().min(h);
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    for py in min_y as u32..max_y as u32 {
        for px in min_x as u32..max_x as u32 {
            let (cx, cy) = (px as f64 + 0.5, py as f64 + 0.5);
            let b0 = edge(&s[1], &s[2], cx, cy) / area;
            let b1 = edge(&s[2], &s[0], cx, cy) / area;
            let b2 = edge(&s[0], &s[1], cx, cy) / area;
            // Slack so pixel centers on a shared edge are not dropped
            if b0 < -1e-6 || b1 < -1e-6 || b2 < -1e-6 {
                continue;
            }
            let (b0, b1, b2) = (b0 as f32, b1 as f32, b2 as f32);

            let inv_w = b0 * s[0].inv_w + b1 * s[1].inv_w + b2 * s[2].inv_w;
            if inv_w <= 0.0 {
                continue;
            }
            let depth = 1.0 / inv_w;
            let slot = &mut hits[py as usize * width as usize + px as usize];
            if slot.is_none_or(|hit| depth < hit.depth) {
                let position = (s[0].world_over_w * b0
                    + s[1].world_over_w * b1
                    + s[2].world_over_w * b2)
                    * depth;
                *slot = Some(Hit {
                    depth,
                    entity: surface.entity,
                    position,
                    normal: surface.normal,
                    color: surface.color,
                });
            }
        }
    }
}

/// Renders motion-blurred linear RGB radiance, one value per pixel.
pub(crate) fn render_radiance<'a>(
    entities: impl Iterator<Item = (EntityId, &'a SceneEntity)> + Clone,
    camera: &Camera,
    background: &Vec3,
    width: u32,
    height: u32,
    samples_per_pixel: u32,
) -> Vec<Vec3> {
    let samples = samples_per_pixel.max(1);
    let weight = 1.0 / samples as f32;
    let pixels = width as usize * height as usize;
    let mut color = vec![Vec3::zeros(); pixels];
    let mut coverage = vec![0.0f32; pixels];

    for s in 0..samples {
        // Stratified shutter time
        let t = (s as f32 + 0.5) * weight;
        let hits = rasterize(entities.clone(), camera, width, height, t);
        for (i, hit) in hits.iter().enumerate() {
            if let Some(hit) = hit {
                color[i] += hit.color * weight;
                coverage[i] += weight;
            }
        }
    }

    color
        .iter()
        .zip(&coverage)
        .map(|(c, cov)| c + background * (1.0 - cov.min(1.0)))
        .collect()
}

/// Quantizes linear radiance to RGB8, clamping to `[0, 1]`.
pub(crate) fn to_rgb8(radiance: &[Vec3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(radiance.len() * 3);
    for pixel in radiance {
        out.extend(pixel.iter().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8));
    }
    out
}
