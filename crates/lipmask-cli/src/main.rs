use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::imageops::{self, FilterType};
use lipmask_core::{canonicalize, crop_bounds, Compositor, JawMaskMode, Occlusion};
use lipmask_feed::ManifestSource;
use std::path::PathBuf;
use std::sync::Arc;

mod batch;
mod config;

#[derive(Parser)]
#[command(name = "lipmask", about = "Build lip-sync training frames from annotated video frames")]
struct Cli {
    /// Pipeline config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose three-panel training images for every frame in a manifest
    Build {
        /// Annotation manifest (JSON)
        manifest: PathBuf,
        /// Output directory for `<frame>.png` files
        #[arg(short, long)]
        out: PathBuf,
        /// Panel resolution in pixels
        #[arg(long)]
        resolution: Option<u32>,
        /// Batch seed for jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Frames composed in parallel
        #[arg(short, long, default_value_t = default_jobs())]
        jobs: usize,
        /// Consider only the first N manifest entries; skipped entries
        /// count toward N and outputs keep their manifest index as name
        #[arg(long)]
        max_frames: Option<usize>,
        /// Keep only the jaw region instead of painting over it
        #[arg(long)]
        stencil: bool,
        /// Occlude with a fitted ellipse instead of the jaw polygon
        #[arg(long)]
        ellipse: bool,
    },
    /// Print the square crop bounds of every frame as JSON lines
    Bounds {
        manifest: PathBuf,
    },
    /// Render one frame's canonical lip outline
    Lips {
        manifest: PathBuf,
        /// Manifest frame index
        #[arg(short, long)]
        frame: usize,
        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
        /// Resize the outline to this many pixels square
        #[arg(long)]
        resolution: Option<u32>,
    },
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut settings = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            manifest,
            out,
            resolution,
            seed,
            jobs,
            max_frames,
            stencil,
            ellipse,
        } => {
            if let Some(resolution) = resolution {
                settings.resolution = resolution;
            }
            if seed.is_some() {
                settings.seed = seed;
            }
            if stencil {
                settings.jaw_mask_mode = JawMaskMode::Stencil;
            }
            if ellipse {
                settings.occlusion = Occlusion::Ellipse;
            }
            let batch_seed = settings.seed.unwrap_or_else(rand::random);

            let source = ManifestSource::open(&manifest)?;
            let compositor = Compositor::new(settings).context("invalid pipeline config")?;
            let summary = batch::run(
                Arc::new(source),
                Arc::new(compositor),
                batch::BatchOptions {
                    out_dir: out,
                    batch_seed,
                    jobs,
                    max_frames,
                },
            )
            .await?;
            println!(
                "wrote {} frames, skipped {} (seed {batch_seed})",
                summary.written, summary.skipped
            );
        }
        Commands::Bounds { manifest } => {
            let source = ManifestSource::open(&manifest)?;
            for index in 0..source.len() {
                match source.landmarks(index) {
                    Ok(landmarks) => {
                        let line = serde_json::json!({
                            "frame": index,
                            "crop": crop_bounds(&landmarks),
                        });
                        println!("{line}");
                    }
                    Err(e) => tracing::warn!(frame = index, reason = %e, "skipping frame"),
                }
            }
        }
        Commands::Lips {
            manifest,
            frame,
            out,
            resolution,
        } => {
            let source = ManifestSource::open(&manifest)?;
            let landmarks = source.landmarks(frame)?;
            let lips = canonicalize(&landmarks.lips())
                .with_context(|| format!("frame {frame}: lip geometry"))?;
            tracing::info!(
                frame,
                angle_deg = lips.angle.to_degrees(),
                side = lips.side,
                "canonicalized lips"
            );
            let mut outline = lips.render();
            if let Some(res) = resolution.filter(|&r| r > 0) {
                outline = imageops::resize(&outline, res, res, FilterType::Triangle);
            }
            outline
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {}", out.display());
        }
    }

    Ok(())
}
