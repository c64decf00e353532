//! Objects dropped onto a floor, rendered with motion blur.
//!
//! A fixed ground slab and `nb_objects` randomly sized cubes and balls start
//! at random poses above it. Every frame the bridge advances physics and the
//! scene is written to `<outf>/<frame:05>.png`, or `.hdr` when HDR output is
//! selected.

use std::path::{Path, PathBuf};

use posebridge::{
    BridgeConfig, BridgeError, PhysicsError, PoseSyncBridge, RenderError, RigidBody,
};
use posebridge_core::math::{Real, Vec3, Vector3, quat_from_xyzw, vec3_from_real};
use posebridge_physics::{BodyDesc, ColliderDesc, RapierWorld};
use posebridge_scene::{Camera, MotionScene, MotionTransform, SceneEntity, Shape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    ParseConfig(#[from] ron::error::SpannedError),
    #[error("failed to create output folder {path}: {source}")]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Settings for the falling-objects scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub bridge: BridgeConfig,
    /// Number of objects to simulate.
    pub nb_objects: usize,
    /// Number of frames to simulate.
    pub nb_frames: u32,
    /// Write every n-th frame.
    pub frame_freq: u32,
    /// Seed for object placement, size, mass and color.
    pub seed: u64,
    /// Output folder for images.
    pub outf: PathBuf,
    /// Write linear Radiance HDR images instead of PNG.
    pub hdr: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            nb_objects: 10,
            nb_frames: 300,
            frame_freq: 1,
            seed: 0,
            outf: PathBuf::from("outf"),
            hdr: false,
        }
    }
}

impl DemoConfig {
    /// Loads a RON config. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let text = std::fs::read_to_string(path).map_err(|source| DemoError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ron::from_str(&text)?)
    }
}

/// What a finished run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub images: Vec<PathBuf>,
    /// Body skips summed over all frames.
    pub skipped: usize,
}

/// Converts HSV in `[0, 1]` to linear RGB.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (i as i32).rem_euclid(6) {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

/// A random `[x, y, z, w]` orientation.
fn random_orientation(rng: &mut StdRng) -> [Real; 4] {
    let q: [Real; 4] = std::array::from_fn(|_| rng.gen_range(-1.0..1.0));
    let norm = q.iter().map(|c| c * c).sum::<Real>().sqrt();
    if norm < 1e-6 {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        q.map(|c| c / norm)
    }
}

/// Builds the physics world, the scene and the bridge tracking every object.
pub fn build(config: &DemoConfig) -> Result<PoseSyncBridge<RapierWorld, MotionScene>, DemoError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut physics = RapierWorld::new();
    let mut scene = MotionScene::new();

    scene.set_camera(
        Camera::looking_at(Vec3::new(10.0, 0.0, 5.0), Vec3::zeros()).with_fov_y(0.785_398),
    );

    // Floor
    physics.spawn(&BodyDesc::fixed(), &ColliderDesc::ground())?;
    scene.spawn(
        SceneEntity::new("floor")
            .with_transform(MotionTransform::from_position(Vec3::new(0.0, 0.0, -0.01)))
            .with_half_extents(Vec3::new(10.0, 10.0, 0.01))
            .with_color(Vec3::new(0.5, 0.5, 0.5)),
    )?;

    let mut pairs = Vec::with_capacity(config.nb_objects);
    for i in 0..config.nb_objects {
        let name = format!("mesh_{i}");
        let position = Vector3::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
            rng.gen_range(2.0..5.0),
        );
        let orientation = random_orientation(&mut rng);
        let size: Real = rng.gen_range(0.2..0.5);
        let mass: Real = rng.gen_range(0.5..2.0);
        let is_ball = rng.gen_bool(0.5);
        let color = hsv_to_rgb(
            rng.gen_range(0.0..1.0),
            rng.gen_range(0.7..1.0),
            rng.gen_range(0.7..1.0),
        );

        let (collider, shape) = if is_ball {
            (ColliderDesc::ball(size), Shape::Sphere)
        } else {
            (ColliderDesc::cuboid(size, size, size), Shape::Box)
        };
        let body = physics.spawn(
            &BodyDesc::dynamic()
                .with_position(position)
                .with_orientation(orientation),
            &collider.with_mass(mass),
        )?;

        let [x, y, z, w] = orientation.map(|c| c as f32);
        let transform = MotionTransform::from_position(vec3_from_real(&position))
            .with_rotation(quat_from_xyzw(x, y, z, w));
        let entity = scene.spawn(
            SceneEntity::new(name.as_str())
                .with_transform(transform)
                .with_shape(shape)
                .with_half_extents(Vec3::repeat(size as f32))
                .with_color(color),
        )?;

        log::info!(
            "added {} {name} at ({:.2}, {:.2}, {:.2})",
            if is_ball { "ball" } else { "cube" },
            position.x,
            position.y,
            position.z
        );
        pairs.push((body, entity));
    }

    let mut bridge = PoseSyncBridge::with_config(physics, scene, config.bridge.clone());
    for (body, entity) in pairs {
        bridge.track(RigidBody::new(body, entity))?;
    }
    Ok(bridge)
}

/// Runs the whole simulation and writes the selected frames.
pub fn run(config: &DemoConfig) -> Result<RunSummary, DemoError> {
    if config.outf.is_dir() {
        log::info!("folder {}/ exists", config.outf.display());
    } else {
        std::fs::create_dir_all(&config.outf).map_err(|source| DemoError::CreateOutput {
            path: config.outf.clone(),
            source,
        })?;
        log::info!("created folder {}/", config.outf.display());
    }

    let mut bridge = build(config)?;
    let mut summary = RunSummary::default();
    let frame_freq = config.frame_freq.max(1);

    for frame in 0..config.nb_frames {
        let report = bridge.step_frame()?;
        summary.skipped += report.skipped.len();
        summary.frames += 1;

        if frame % frame_freq == 0 {
            log::info!("rendering frame {frame:05}/{:05}", config.nb_frames);
            let path = if config.hdr {
                let path = config.outf.join(format!("{frame:05}.hdr"));
                let BridgeConfig {
                    width,
                    height,
                    samples_per_pixel,
                    ..
                } = config.bridge;
                bridge
                    .scene()
                    .render_to_hdr(width, height, samples_per_pixel, &path)?;
                path
            } else {
                let path = config.outf.join(format!("{frame:05}.png"));
                bridge.render_frame(&path)?;
                path
            };
            summary.images.push(path);
        }
        posebridge_core::frame_mark!();
    }

    let (mut physics, mut scene) = bridge.into_parts();
    physics.disconnect();
    scene.cleanup();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(outf: PathBuf) -> DemoConfig {
        DemoConfig {
            bridge: BridgeConfig::default()
                .with_resolution(16, 16)
                .with_samples_per_pixel(1),
            nb_objects: 3,
            nb_frames: 4,
            frame_freq: 2,
            seed: 7,
            outf,
            hdr: false,
        }
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hsv_to_rgb(0.5, 0.0, 0.5), Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn orientations_are_unit() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let q = random_orientation(&mut rng);
            let norm = q.iter().map(|c| c * c).sum::<Real>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn build_tracks_every_object() {
        let config = small_config(PathBuf::from("unused"));
        let bridge = build(&config).unwrap();
        assert_eq!(bridge.len(), 3);
        // Floor plus objects
        assert_eq!(bridge.physics().body_count(), 4);
        assert_eq!(bridge.scene().len(), 4);
        assert!(bridge.scene().find("mesh_2").is_some());
    }

    #[test]
    fn same_seed_same_scene() {
        let config = small_config(PathBuf::from("unused"));
        let a = build(&config).unwrap();
        let b = build(&config).unwrap();
        let poses = |bridge: &PoseSyncBridge<RapierWorld, MotionScene>| {
            bridge
                .scene()
                .iter()
                .map(|(_, entity)| entity.transform.position)
                .collect::<Vec<_>>()
        };
        assert_eq!(poses(&a), poses(&b));
    }

    #[test]
    fn run_writes_every_nth_frame() {
        let outf = std::env::temp_dir().join(format!("posebridge-demo-{}", std::process::id()));
        let summary = run(&small_config(outf.clone())).unwrap();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.skipped, 0);
        assert_eq!(
            summary.images,
            vec![outf.join("00000.png"), outf.join("00002.png")]
        );
        assert!(outf.join("00002.png").is_file());
        assert!(!outf.join("00001.png").exists());
        std::fs::remove_dir_all(&outf).unwrap();
    }

    #[test]
    fn balls_are_drawn_as_spheres() {
        let config = DemoConfig {
            nb_objects: 20,
            ..small_config(PathBuf::from("unused"))
        };
        let bridge = build(&config).unwrap();
        let shapes: Vec<Shape> = bridge
            .scene()
            .iter()
            .filter(|(_, entity)| entity.name.starts_with("mesh_"))
            .map(|(_, entity)| entity.shape)
            .collect();
        assert!(shapes.contains(&Shape::Sphere));
        assert!(shapes.contains(&Shape::Box));
    }

    #[test]
    fn objects_settle_on_the_floor() {
        let config = DemoConfig {
            nb_objects: 4,
            ..small_config(PathBuf::from("unused"))
        };
        let mut bridge = build(&config).unwrap();
        for _ in 0..90 {
            let report = bridge.step_frame().unwrap();
            assert!(report.is_clean());
        }
        for (_, entity) in bridge.scene().iter() {
            if entity.name.starts_with("mesh_") {
                assert!(entity.transform.position.z > 0.0);
                assert!(entity.transform.position.z < 2.0);
            }
        }
    }

    #[test]
    fn run_writes_hdr_frames() {
        let outf = std::env::temp_dir().join(format!("posebridge-demo-hdr-{}", std::process::id()));
        let config = DemoConfig {
            nb_frames: 1,
            hdr: true,
            ..small_config(outf.clone())
        };
        let summary = run(&config).unwrap();
        assert_eq!(summary.images, vec![outf.join("00000.hdr")]);
        assert!(outf.join("00000.hdr").is_file());
        std::fs::remove_dir_all(&outf).unwrap();
    }

    #[test]
    fn partial_ron_config() {
        let config: DemoConfig =
            ron::from_str("(nb_objects: 2, bridge: (samples_per_pixel: 4))").unwrap();
        assert_eq!(config.nb_objects, 2);
        assert_eq!(config.bridge.samples_per_pixel, 4);
        assert_eq!(config.bridge.mix, 0.8);
        assert_eq!(config.nb_frames, 300);
        assert!(!config.hdr);
    }
}
