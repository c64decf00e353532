//! # Falling Objects
//!
//! Drops random objects onto a floor and writes one motion-blurred PNG per
//! frame.
//!
//! ```text
//! falling_objects --nb-objects 20 --spp 64 --outf out
//! ```

use std::path::PathBuf;

use clap::Parser;
use posebridge_demos::falling_objects::{self, DemoConfig};

/// Command line arguments. Flags override values from `--config`.
#[derive(Parser, Debug)]
#[command(name = "falling_objects")]
#[command(about = "Physics-driven motion blur demo")]
#[command(version)]
struct Args {
    /// RON file with a full or partial demo configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of objects to simulate
    #[arg(long)]
    nb_objects: Option<usize>,

    /// Samples per pixel
    #[arg(long)]
    spp: Option<u32>,

    /// Image width
    #[arg(long)]
    width: Option<u32>,

    /// Image height
    #[arg(long)]
    height: Option<u32>,

    /// Number of frames to simulate
    #[arg(long)]
    nb_frames: Option<u32>,

    /// Write every n-th frame
    #[arg(long)]
    frame_freq: Option<u32>,

    /// Folder to output the images
    #[arg(long)]
    outf: Option<PathBuf>,

    /// Seed for the random scene
    #[arg(long)]
    seed: Option<u64>,

    /// Write linear HDR images instead of PNG
    #[arg(long)]
    hdr: bool,
}

impl Args {
    fn into_config(self) -> Result<DemoConfig, falling_objects::DemoError> {
        let mut config = match &self.config {
            Some(path) => DemoConfig::load(path)?,
            None => DemoConfig::default(),
        };
        if let Some(nb_objects) = self.nb_objects {
            config.nb_objects = nb_objects;
        }
        if let Some(spp) = self.spp {
            config.bridge.samples_per_pixel = spp;
        }
        if let Some(width) = self.width {
            config.bridge.width = width;
        }
        if let Some(height) = self.height {
            config.bridge.height = height;
        }
        if let Some(nb_frames) = self.nb_frames {
            config.nb_frames = nb_frames;
        }
        if let Some(frame_freq) = self.frame_freq {
            config.frame_freq = frame_freq;
        }
        if let Some(outf) = self.outf {
            config.outf = outf;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if self.hdr {
            config.hdr = true;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    posebridge_core::profiling::start();

    let config = Args::parse().into_config()?;
    log::info!(
        "{} objects, {} frames at {}x{} with {} spp",
        config.nb_objects,
        config.nb_frames,
        config.bridge.width,
        config.bridge.height,
        config.bridge.samples_per_pixel
    );

    let summary = falling_objects::run(&config)?;
    log::info!(
        "wrote {} images to {}/ ({} skipped body updates)",
        summary.images.len(),
        config.outf.display(),
        summary.skipped
    );
    Ok(())
}
