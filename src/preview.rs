//! Off-thread, single-flight preview rendering.
//!
//! Slider movement produces a stream of render requests far faster than a
//! large image can be rendered. Requests are numbered by a generation
//! counter and only the newest generation may reach the screen:
//!
//! ```text
//! request(g1) ─┐
//! request(g2) ─┼─► worker: g1 aborts between stages, g2 skipped, g3 rendered
//! request(g3) ─┘                                       │
//!                                 poll()/wait() ◄──────┘  (older results dropped)
//! ```
//!
//! The worker is a one-thread [rayon](https://docs.rs/rayon) pool, so at most
//! one render runs at a time and renders never pile up behind each other:
//! a queued job that is already stale when it starts returns immediately.

use crate::imaging::{AdjustmentParams, AdjustmentPipeline, ImageBuffer, RenderError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Failed to start preview worker: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A finished preview for one request.
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub generation: u64,
    pub params: AdjustmentParams,
    pub image: ImageBuffer,
    /// True when the params were rejected and the unadjusted source is shown instead.
    pub fallback: bool,
}

/// Renders previews on a background thread, newest request wins.
pub struct PreviewRenderer {
    pipeline: AdjustmentPipeline,
    pool: rayon::ThreadPool,
    latest: Arc<AtomicU64>,
    tx: Sender<RenderedPreview>,
    rx: Receiver<RenderedPreview>,
}

impl PreviewRenderer {
    pub fn new(pipeline: AdjustmentPipeline) -> Result<Self, PreviewError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("preview-render-{i}"))
            .build()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            pipeline,
            pool,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        })
    }

    /// Queue a render, superseding every earlier request.
    ///
    /// Returns the generation number the result will carry.
    pub fn request(&self, source: Arc<ImageBuffer>, params: AdjustmentParams) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        let pipeline = self.pipeline;
        debug!(generation, "Preview requested");
        self.pool.spawn(move || {
            let job = PreviewJob {
                generation,
                latest: &latest,
            };
            if let Some(preview) = job.run(&pipeline, &source, params) {
                // The receiver only disappears with the renderer itself.
                let _ = tx.send(preview);
            }
        });
        generation
    }

    /// Invalidate every outstanding request without queuing a new one.
    pub fn cancel(&self) {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Pending previews cancelled");
    }

    /// Generation of the most recent request (or cancellation).
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// The result for the latest request, if it has arrived. Never blocks.
    pub fn poll(&self) -> Option<RenderedPreview> {
        let current = self.latest_generation();
        let mut newest = None;
        while let Ok(preview) = self.rx.try_recv() {
            if preview.generation == current {
                newest = Some(preview);
            }
        }
        newest
    }

    /// Block until the latest request's result arrives or `timeout` passes.
    pub fn wait(&self, timeout: Duration) -> Option<RenderedPreview> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let preview = self.rx.recv_timeout(remaining).ok()?;
            if preview.generation == self.latest_generation() {
                return Some(preview);
            }
        }
    }
}

struct PreviewJob<'a> {
    generation: u64,
    latest: &'a AtomicU64,
}

impl PreviewJob<'_> {
    fn is_stale(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    fn run(
        &self,
        pipeline: &AdjustmentPipeline,
        source: &ImageBuffer,
        params: AdjustmentParams,
    ) -> Option<RenderedPreview> {
        let generation = self.generation;
        if self.is_stale() {
            debug!(generation, "Skipping superseded preview");
            return None;
        }

        let outcome =
            pipeline.render_abortable(source, &params, &mut rand::rng(), || self.is_stale());
        let (image, fallback) = match outcome {
            Ok(Some(image)) => (image, false),
            Ok(None) => return None,
            Err(RenderError::InvalidParams(err)) => {
                error!(generation, %err, "Invalid params reached the pipeline, showing source unadjusted");
                (source.clone(), true)
            }
            Err(err @ RenderError::EmptyImage { .. }) => {
                warn!(generation, %err, "Preview skipped");
                return None;
            }
        };

        if self.is_stale() {
            debug!(generation, "Discarding superseded preview");
            return None;
        }
        Some(RenderedPreview {
            generation,
            params,
            image,
            fallback,
        })
    }
}
