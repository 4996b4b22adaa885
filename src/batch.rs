// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Batch processing module.
//!
//! This module provides the [`BatchRunner`], which fans a scanned dataset out
//! over a bounded worker pool: every image is decoded, pose-estimated,
//! normalized and rasterized (once, or many times through the augmenter), and
//! the rasters are written into a mirror of the dataset tree.
//!
//! Recoverable per-image failures never stop the batch. They are logged and
//! collected in the [`BatchReport`]. Persistence failures are counted globally
//! and abort the run once `max_persistence_failures` is reached. Any other
//! error (see [`PostureError::is_recoverable`]) cancels the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::augment::augment;
use crate::config::PipelineConfig;
use crate::dataset::{DatasetLayout, WorkItem};
use crate::error::{PostureError, Result};
use crate::io::{decode_image, save_pose_json, save_raster};
use crate::model::PoseEstimator;
use crate::normalize::normalize;
use crate::pose::Pose;
use crate::utils::count_noun;
use crate::visualizer::{SkeletonRaster, rasterize};
use crate::{error, success, verbose, warn};

/// Shared cancellation flag.
///
/// Cloning yields a handle to the same flag. Workers check it before each
/// image and between synthetic variants.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a batch run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// One raster per source image, named by its listing index.
    Real,
    /// `count` jittered rasters per source image, named by a per-label counter.
    Synthetic {
        /// Variants per image.
        count: usize,
    },
}

impl BatchMode {
    /// Synthetic mode with the configured variant count.
    #[must_use]
    pub const fn synthetic(config: &PipelineConfig) -> Self {
        Self::Synthetic {
            count: config.synthetic_count,
        }
    }
}

/// An image the batch could not turn into output.
#[derive(Debug)]
pub struct SkippedImage {
    /// Source image path.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: PostureError,
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Images that went through the pipeline (written or skipped).
    pub processed: usize,
    /// Raster files written.
    pub written: usize,
    /// Images skipped, with their reasons.
    pub skipped: Vec<SkippedImage>,
    /// Images not finished because the run was cancelled.
    pub cancelled: usize,
}

impl BatchReport {
    /// Whether every image produced output.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.cancelled == 0
    }
}

enum ItemStatus {
    Done,
    Skipped(SkippedImage),
    Cancelled,
    Fatal(PostureError),
}

struct ItemOutcome {
    written: usize,
    status: ItemStatus,
}

impl ItemOutcome {
    const fn new(written: usize, status: ItemStatus) -> Self {
        Self { written, status }
    }
}

fn skipped(item: &WorkItem, reason: PostureError) -> ItemStatus {
    ItemStatus::Skipped(SkippedImage {
        path: item.path.clone(),
        reason,
    })
}

type LabelCounters = HashMap<(String, String), AtomicUsize>;

/// Runs the dataset pipeline over a bounded worker pool.
///
/// # Example
///
/// ```no_run
/// use posture_skeleton::batch::{BatchMode, BatchRunner};
/// use posture_skeleton::dataset::DatasetLayout;
/// use posture_skeleton::onnx::YoloPoseEstimator;
/// use posture_skeleton::PipelineConfig;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let estimator = YoloPoseEstimator::load("yolo11n-pose.onnx")?;
///     let runner = BatchRunner::new(estimator, PipelineConfig::default(), "processed", "fake")?;
///     let layout = DatasetLayout::scan("data")?;
///     let report = runner.run(&layout, BatchMode::Real)?;
///     println!("{} rasters written", report.written);
///     Ok(())
/// }
/// ```
pub struct BatchRunner<P: PoseEstimator> {
    estimator: P,
    config: PipelineConfig,
    real_root: PathBuf,
    fake_root: PathBuf,
    pool: ThreadPool,
    token: CancelToken,
}

impl<P: PoseEstimator> BatchRunner<P> {
    /// Create a runner writing real rasters under `real_root` and synthetic
    /// ones under `fake_root`.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::ConfigError`] if the configuration is invalid or
    /// the worker pool cannot be built.
    pub fn new(
        estimator: P,
        config: PipelineConfig,
        real_root: impl Into<PathBuf>,
        fake_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_workers)
            .thread_name(|i| format!("posture-worker-{i}"))
            .build()
            .map_err(|e| PostureError::ConfigError(format!("Failed to build worker pool: {e}")))?;

        Ok(Self {
            estimator,
            config,
            real_root: real_root.into(),
            fake_root: fake_root.into(),
            pool,
            token: CancelToken::new(),
        })
    }

    /// Use an externally owned cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Handle to this runner's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Output root for `mode`.
    #[must_use]
    pub fn output_root(&self, mode: BatchMode) -> &Path {
        match mode {
            BatchMode::Real => &self.real_root,
            BatchMode::Synthetic { .. } => &self.fake_root,
        }
    }

    /// Create the mirrored label tree under both output roots.
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::PersistenceError`] if a directory cannot be created.
    pub fn prepare_outputs(&self, layout: &DatasetLayout) -> Result<()> {
        layout.mirror_into(&self.real_root)?;
        layout.mirror_into(&self.fake_root)
    }

    /// Process every image of `layout`.
    ///
    /// Returns once all workers have finished (or observed cancellation).
    ///
    /// # Errors
    ///
    /// Returns [`PostureError::PersistenceError`] if the output tree cannot be
    /// created or if persistence failures reach the configured limit, and the
    /// first non-recoverable pipeline error if one stopped the run.
    pub fn run(&self, layout: &DatasetLayout, mode: BatchMode) -> Result<BatchReport> {
        let output_root = self.output_root(mode);
        layout.mirror_into(output_root)?;

        let items = layout.work_items();
        let counters: LabelCounters = layout
            .label_dirs()
            .map(|(s, l)| ((s.to_string(), l.to_string()), AtomicUsize::new(0)))
            .collect();
        let failures = AtomicUsize::new(0);

        let outcomes: Vec<ItemOutcome> = self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(ordinal, item)| {
                    self.process_item(ordinal, item, mode, output_root, &counters, &failures)
                })
                .collect()
        });

        let mut report = BatchReport::default();
        let mut fatal = None;
        for outcome in outcomes {
            report.written += outcome.written;
            match outcome.status {
                ItemStatus::Done => report.processed += 1,
                ItemStatus::Skipped(skipped) => {
                    report.processed += 1;
                    report.skipped.push(skipped);
                }
                ItemStatus::Cancelled => report.cancelled += 1,
                ItemStatus::Fatal(e) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        let failures = failures.load(Ordering::SeqCst);
        if self.persistence_limit_reached(failures) {
            return Err(PostureError::PersistenceError(format!(
                "aborted after {}",
                count_noun(failures, "persistence failure")
            )));
        }

        success!(
            "{} processed, {} written, {} skipped{}",
            count_noun(report.processed, "image"),
            count_noun(report.written, "raster"),
            report.skipped.len(),
            if report.cancelled > 0 {
                format!(", {} cancelled", report.cancelled)
            } else {
                String::new()
            }
        );
        Ok(report)
    }

    /// Decode, estimate and normalize one source image.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline error hit for this image.
    pub fn prepare_pose(&self, path: &Path) -> Result<Pose> {
        let image = decode_image(path)?;
        let pose = self.estimator.estimate(&image)?;
        normalize(&pose, &self.config)
    }

    const fn persistence_limit_reached(&self, failures: usize) -> bool {
        self.config.max_persistence_failures > 0 && failures >= self.config.max_persistence_failures
    }

    fn process_item(
        &self,
        ordinal: usize,
        item: &WorkItem,
        mode: BatchMode,
        output_root: &Path,
        counters: &LabelCounters,
        failures: &AtomicUsize,
    ) -> ItemOutcome {
        if self.token.is_cancelled() {
            return ItemOutcome::new(0, ItemStatus::Cancelled);
        }

        let pose = match self.prepare_pose(&item.path) {
            Ok(pose) => pose,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping {}: {e}", item.path.display());
                return ItemOutcome::new(0, skipped(item, e));
            }
            Err(e) => {
                error!("{}: {e}", item.path.display());
                self.token.cancel();
                return ItemOutcome::new(0, ItemStatus::Fatal(e));
            }
        };

        let dir = item.output_dir(output_root);
        match mode {
            BatchMode::Real => {
                let raster = rasterize(&pose, &self.config);
                match self.persist(&dir, item.index, &pose, &raster) {
                    Ok(()) => {
                        verbose!("{} -> {}", item.path.display(), dir.display());
                        ItemOutcome::new(1, ItemStatus::Done)
                    }
                    Err(e) => ItemOutcome::new(0, self.persistence_failed(item, e, failures)),
                }
            }
            BatchMode::Synthetic { count } => {
                let key = (item.subject.clone(), item.label.clone());
                let Some(counter) = counters.get(&key) else {
                    return ItemOutcome::new(
                        0,
                        skipped(
                            item,
                            PostureError::PersistenceError(format!(
                                "no output directory for {}/{}",
                                item.subject, item.label
                            )),
                        ),
                    );
                };

                let mut rng = self.item_rng(ordinal);
                let mut written = 0;
                for _ in 0..count {
                    if self.token.is_cancelled() {
                        return ItemOutcome::new(written, ItemStatus::Cancelled);
                    }
                    let variant = augment(&pose, self.config.jitter_radius, &mut rng);
                    let raster = rasterize(&variant, &self.config);
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if let Err(e) = self.persist(&dir, n, &variant, &raster) {
                        return ItemOutcome::new(written, self.persistence_failed(item, e, failures));
                    }
                    written += 1;
                }
                verbose!(
                    "{} -> {} ({})",
                    item.path.display(),
                    dir.display(),
                    count_noun(written, "variant")
                );
                ItemOutcome::new(written, ItemStatus::Done)
            }
        }
    }

    fn item_rng(&self, ordinal: usize) -> StdRng {
        self.config.seed.map_or_else(StdRng::from_entropy, |seed| {
            StdRng::seed_from_u64(seed.wrapping_add(ordinal as u64))
        })
    }

    /// Write the raster and, if enabled, its JSON. A unit is all or nothing:
    /// the raster is removed again when the JSON cannot be written.
    fn persist(&self, dir: &Path, n: usize, pose: &Pose, raster: &SkeletonRaster) -> Result<()> {
        let raster_path = dir.join(format!("{n}.{}", self.config.image_format));
        save_raster(raster, &raster_path)?;
        if self.config.save_json
            && let Err(e) = save_pose_json(pose, dir.join(format!("{n}.json")))
        {
            let _ = std::fs::remove_file(&raster_path);
            return Err(e);
        }
        Ok(())
    }

    fn persistence_failed(
        &self,
        item: &WorkItem,
        e: PostureError,
        failures: &AtomicUsize,
    ) -> ItemStatus {
        warn!("Failed to write output for {}: {e}", item.path.display());
        let total = failures.fetch_add(1, Ordering::SeqCst) + 1;
        if self.persistence_limit_reached(total) {
            self.token.cancel();
        }
        skipped(item, e)
    }
}
