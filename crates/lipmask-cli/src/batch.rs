//! Batch driver: composes every manifest frame on the blocking pool and
//! writes `<frame index>.png` into the output directory.

use anyhow::{Context, Result};
use lipmask_core::{frame_rng, Compositor};
use lipmask_feed::ManifestSource;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

const PROGRESS_EVERY: usize = 10;

pub struct BatchOptions {
    pub out_dir: PathBuf,
    pub batch_seed: u64,
    /// Maximum frames composed at once.
    pub jobs: usize,
    /// Only the first `max_frames` manifest entries are considered.
    pub max_frames: Option<usize>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped: usize,
}

enum Outcome {
    Written(PathBuf),
    Skipped(String),
}

/// Compose and write every frame. A frame that fails landmark or
/// geometry checks is skipped; a failed write aborts the batch.
pub async fn run(
    source: Arc<ManifestSource>,
    compositor: Arc<Compositor>,
    opts: BatchOptions,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("creating output directory {}", opts.out_dir.display()))?;

    let total = opts.max_frames.map_or(source.len(), |n| n.min(source.len()));
    let jobs = opts.jobs.max(1);
    tracing::info!(
        frames = total,
        jobs,
        seed = opts.batch_seed,
        out = %opts.out_dir.display(),
        "starting batch"
    );

    let mut summary = BatchSummary::default();
    let mut done = 0usize;
    let mut tasks = JoinSet::new();
    let out_dir = Arc::new(opts.out_dir);

    for index in 0..total {
        if tasks.len() >= jobs {
            if let Some(joined) = tasks.join_next().await {
                record(joined??, &mut summary, &mut done, total);
            }
        }
        let (source, compositor, out_dir) = (source.clone(), compositor.clone(), out_dir.clone());
        let seed = opts.batch_seed;
        tasks.spawn_blocking(move || {
            guarded(|| process_frame(&source, &compositor, &out_dir, seed, index)).map(|o| (index, o))
        });
    }
    while let Some(joined) = tasks.join_next().await {
        record(joined??, &mut summary, &mut done, total);
    }

    tracing::info!(written = summary.written, skipped = summary.skipped, "batch complete");
    Ok(summary)
}

fn record((index, outcome): (usize, Outcome), summary: &mut BatchSummary, done: &mut usize, total: usize) {
    match outcome {
        Outcome::Written(path) => {
            summary.written += 1;
            tracing::debug!(frame = index, path = %path.display(), "wrote frame");
        }
        Outcome::Skipped(reason) => {
            summary.skipped += 1;
            tracing::warn!(frame = index, %reason, "skipping frame");
        }
    }
    *done += 1;
    if *done % PROGRESS_EVERY == 0 {
        tracing::info!("on frame {done} of {total}");
    }
}

/// Run one frame's work. A panic inside it skips the frame instead of
/// surfacing as a `JoinError` that ends the batch.
fn guarded(work: impl FnOnce() -> Result<Outcome>) -> Result<Outcome> {
    panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Ok(Outcome::Skipped(format!("panicked: {reason}")))
    })
}

fn process_frame(
    source: &ManifestSource,
    compositor: &Compositor,
    out_dir: &Path,
    batch_seed: u64,
    index: usize,
) -> Result<Outcome> {
    let frame = match source.load(index) {
        Ok(frame) => frame,
        Err(e) if e.is_frame_local() => return Ok(Outcome::Skipped(e.to_string())),
        Err(e) => return Err(e.into()),
    };

    let mut rng = frame_rng(batch_seed, index as u64);
    let composite = match compositor.compose(&frame.image, &frame.landmarks, &mut rng) {
        Ok(composite) => composite,
        Err(e) => return Ok(Outcome::Skipped(e.to_string())),
    };

    let path = out_dir.join(format!("{index}.png"));
    composite
        .image()
        .save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(Outcome::Written(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use lipmask_core::PipelineConfig;
    use lipmask_feed::Manifest;
    use std::f64::consts::PI;

    /// Frontal face in a 200×200 frame, as `[x, y]` pairs.
    fn face() -> Vec<[f64; 2]> {
        let mut pts = Vec::new();
        let arc = |pts: &mut Vec<[f64; 2]>, n: usize, start: f64, step: f64, c: (f64, f64), r: (f64, f64)| {
            for i in 0..n {
                let t = start + i as f64 * step;
                pts.push([(c.0 + r.0 * t.cos()).round(), (c.1 + r.1 * t.sin()).round()]);
            }
        };
        arc(&mut pts, 17, PI, -PI / 16.0, (100.0, 90.0), (70.0, 80.0));
        pts.extend((0..10).map(|i| [45.0 + 12.0 * i as f64, 60.0]));
        pts.extend((0..4).map(|i| [100.0, 70.0 + 8.0 * i as f64]));
        pts.extend((0..5).map(|i| [88.0 + 6.0 * i as f64, 105.0]));
        arc(&mut pts, 6, 0.0, PI / 3.0, (70.0, 75.0), (10.0, 4.0));
        arc(&mut pts, 6, 0.0, PI / 3.0, (130.0, 75.0), (10.0, 4.0));
        arc(&mut pts, 12, PI, PI / 6.0, (100.0, 130.0), (25.0, 12.0));
        arc(&mut pts, 8, PI, PI / 4.0, (100.0, 130.0), (15.0, 5.0));
        pts
    }

    #[test]
    fn test_panicking_frame_is_skipped() {
        let outcome = guarded(|| panic!("bad frame {}", 7)).unwrap();
        assert!(matches!(outcome, Outcome::Skipped(ref reason) if reason.contains("bad frame 7")));

        let outcome = guarded(|| Ok(Outcome::Written(PathBuf::from("0.png")))).unwrap();
        assert!(matches!(outcome, Outcome::Written(_)));
        assert!(guarded(|| Err(anyhow::anyhow!("disk full"))).is_err());
    }

    #[tokio::test]
    async fn test_batch_writes_good_frames_and_skips_bad_ones() {
        let dir = std::env::temp_dir().join(format!("lipmask-batch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(200, 200, Rgb([90, 60, 40]))
            .save(dir.join("frame.png"))
            .unwrap();

        let manifest = Manifest {
            frames: vec![
                lipmask_feed::FrameEntry { image: "frame.png".into(), faces: vec![face()] },
                lipmask_feed::FrameEntry { image: "frame.png".into(), faces: vec![] },
                lipmask_feed::FrameEntry { image: "frame.png".into(), faces: vec![face(), face()] },
                lipmask_feed::FrameEntry { image: "frame.png".into(), faces: vec![face()] },
            ],
        };
        let source = Arc::new(ManifestSource::new(dir.clone(), manifest));
        let config = PipelineConfig { resolution: 32, ..Default::default() };
        let compositor = Arc::new(Compositor::new(config).unwrap());
        let out_dir = dir.join("out");

        let summary = run(
            source,
            compositor,
            BatchOptions { out_dir: out_dir.clone(), batch_seed: 11, jobs: 2, max_frames: Some(3) },
        )
        .await
        .unwrap();

        assert_eq!(summary, BatchSummary { written: 1, skipped: 2 });
        let written = image::open(out_dir.join("0.png")).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (96, 32));
        assert!(!out_dir.join("3.png").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
