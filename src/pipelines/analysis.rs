// SPDX-License-Identifier: GPL-3.0-only

//! Single-worker analysis pipeline with keep-only-latest backpressure
//!
//! ```text
//! FrameSource ──submit──▶ [ pending slot ] ──▶ worker: FrameAnalyzer ──▶ sink
//!                  │                                 │
//!                  └─ replaced frame released        └─ at most one in flight
//! ```
//!
//! The slot holds at most one frame. Submitting while a frame is pending
//! releases the older one, so the worker always picks up the most recent frame
//! and never falls behind the source. Filter and orientation changes bump a
//! generation counter; the worker rebuilds its analyzer when it sees a new
//! generation and discards results finished under an old one.

use super::analyzer::{AnalysisResult, AnalyzerSettings, FrameAnalyzer};
use super::filters::FilterKind;
use crate::backends::camera::frame_loop::{FrameLoopController, LoopAction};
use crate::backends::camera::types::CameraFrame;
use crate::errors::{AppError, AppResult, FrameError};
use crate::media::orientation::Orientation;
use futures::channel::mpsc;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, trace, warn};

/// Consumer of analysis results, called on the worker thread
///
/// Must not block; see [`channel_sink`] for a non-blocking hand-off.
pub type ResultSink = Box<dyn FnMut(AnalysisResult) + Send + 'static>;

/// Sink that forwards results into a bounded channel
///
/// When the receiver has not taken the previous results yet, new ones are
/// dropped instead of blocking the worker.
pub fn channel_sink(capacity: usize) -> (ResultSink, mpsc::Receiver<AnalysisResult>) {
    // futures reserves one extra slot per sender
    let (mut sender, receiver) = mpsc::channel(capacity.saturating_sub(1));

    let sink = Box::new(move |result: AnalysisResult| {
        let sequence = result.sequence;
        if let Err(e) = sender.try_send(result) {
            if e.is_full() {
                trace!(sequence, "Display busy, dropping result");
            } else {
                debug!(sequence, "Result receiver disconnected");
            }
        }
    });

    (sink, receiver)
}

/// Counters describing what happened to submitted frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames handed to the pipeline
    pub submitted: u64,
    /// Pending frames replaced by a newer one
    pub superseded: u64,
    /// Pending frames discarded by a filter switch or shutdown
    pub cancelled: u64,
    /// Frames taken by the worker
    pub analyzed: u64,
    /// Results delivered to the sink
    pub published: u64,
    /// Frames rejected by conversion or a failing filter
    pub failed: u64,
    /// Results discarded because the selection changed mid-analysis
    pub stale: u64,
    /// Frames currently being analyzed (0 or 1)
    pub in_flight: u64,
    /// Highest `in_flight` ever observed
    pub max_in_flight: u64,
}

/// State shared between submitters, the control handle and the worker
struct Slot {
    pending: Option<CameraFrame>,
    settings: AnalyzerSettings,
    generation: u64,
    shutdown: bool,
    stats: PipelineStats,
}

struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

impl Shared {
    fn new(settings: AnalyzerSettings) -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                settings,
                generation: 0,
                shutdown: false,
                stats: PipelineStats::default(),
            }),
            wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submit(&self, frame: CameraFrame) {
        let sequence = frame.sequence;
        let released = {
            let mut slot = self.lock();
            slot.stats.submitted += 1;

            if slot.shutdown {
                slot.stats.cancelled += 1;
                Some(frame)
            } else {
                let replaced = slot.pending.replace(frame);
                if replaced.is_some() {
                    slot.stats.superseded += 1;
                }
                self.wake.notify_one();
                replaced
            }
        };

        // Released outside the lock; the hook may call back into the source
        if let Some(old) = released {
            trace!(sequence = old.sequence, replaced_by = sequence, "Releasing unanalyzed frame");
            old.release();
        }
    }

    /// Apply a settings change, cancelling the pending frame
    fn reconfigure(&self, update: impl FnOnce(&mut AnalyzerSettings) -> bool) {
        let cancelled = {
            let mut slot = self.lock();
            if !update(&mut slot.settings) {
                return;
            }
            slot.generation += 1;
            debug!(
                generation = slot.generation,
                filter = %slot.settings.filter,
                "Analyzer settings changed"
            );
            let cancelled = slot.pending.take();
            if cancelled.is_some() {
                slot.stats.cancelled += 1;
            }
            cancelled
        };
        drop(cancelled);
    }
}

/// Cloneable handle for delivering frames from a source thread
#[derive(Clone)]
pub struct FrameSubmitter {
    shared: Arc<Shared>,
}

impl FrameSubmitter {
    /// Hand a frame to the pipeline
    ///
    /// Never blocks on analysis. A frame still waiting from an earlier call is
    /// released.
    pub fn submit(&self, frame: CameraFrame) {
        self.shared.submit(frame);
    }
}

impl std::fmt::Debug for FrameSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSubmitter").finish_non_exhaustive()
    }
}

/// Worker-owned state
struct Worker {
    analyzer: Option<(u64, FrameAnalyzer)>,
    sink: ResultSink,
}

/// Analysis pipeline: one pending slot, one worker thread, one sink
pub struct AnalysisPipeline {
    shared: Arc<Shared>,
    worker: Option<FrameLoopController>,
}

impl AnalysisPipeline {
    /// Start the worker thread
    pub fn new(settings: AnalyzerSettings, sink: ResultSink) -> AppResult<Self> {
        let shared = Arc::new(Shared::new(settings));

        info!(
            filter = %settings.filter,
            rotation = %settings.orientation.rotation,
            mirror = settings.orientation.mirror,
            "Starting analysis pipeline"
        );

        let worker_shared = Arc::clone(&shared);
        let worker = FrameLoopController::start_with_init(
            "frame-analysis",
            move || {
                Ok(Worker {
                    analyzer: None,
                    sink,
                })
            },
            move |worker: &mut Worker| run_once(&worker_shared, worker),
        )
        .map_err(|e| AppError::Other(format!("Failed to spawn analysis worker: {}", e)))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Handle for frame sources
    pub fn submitter(&self) -> FrameSubmitter {
        FrameSubmitter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn submit(&self, frame: CameraFrame) {
        self.shared.submit(frame);
    }

    /// Select a different filter; takes effect before the next analyzed frame
    pub fn set_filter(&self, filter: FilterKind) {
        self.shared.reconfigure(|settings| {
            if settings.filter == filter {
                return false;
            }
            settings.filter = filter;
            true
        });
    }

    /// Change rotation or mirroring; takes effect before the next analyzed frame
    pub fn set_orientation(&self, orientation: Orientation) {
        self.shared.reconfigure(|settings| {
            if settings.orientation == orientation {
                return false;
            }
            settings.orientation = orientation;
            true
        });
    }

    pub fn filter(&self) -> FilterKind {
        self.shared.lock().settings.filter
    }

    pub fn settings(&self) -> AnalyzerSettings {
        self.shared.lock().settings
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> PipelineStats {
        self.shared.lock().stats
    }

    /// Stop accepting frames, finish the in-flight one and join the worker
    ///
    /// Idempotent. Frames submitted afterwards are released immediately.
    pub fn shutdown(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };

        let cancelled = {
            let mut slot = self.shared.lock();
            slot.shutdown = true;
            let cancelled = slot.pending.take();
            if cancelled.is_some() {
                slot.stats.cancelled += 1;
            }
            self.shared.wake.notify_all();
            cancelled
        };
        drop(cancelled);

        worker.request_stop();
        worker.join();

        let stats = self.stats();
        info!(
            submitted = stats.submitted,
            published = stats.published,
            superseded = stats.superseded,
            failed = stats.failed,
            "Analysis pipeline stopped"
        );
    }
}

impl Drop for AnalysisPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Wait for a frame, analyze it and publish the result
fn run_once(shared: &Shared, worker: &mut Worker) -> LoopAction {
    let (frame, generation, settings) = {
        let mut slot = shared.lock();
        loop {
            if slot.shutdown {
                return LoopAction::Stop;
            }
            if let Some(frame) = slot.pending.take() {
                slot.stats.analyzed += 1;
                slot.stats.in_flight += 1;
                slot.stats.max_in_flight = slot.stats.max_in_flight.max(slot.stats.in_flight);
                break (frame, slot.generation, slot.settings);
            }
            slot = shared.wake.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    };

    // A new selection gets a fresh analyzer; old scratch goes with the old one
    let mut analyzer = match worker.analyzer.take() {
        Some((built_for, analyzer)) if built_for == generation => analyzer,
        _ => FrameAnalyzer::new(&settings),
    };

    let sequence = frame.sequence;
    let outcome = catch_unwind(AssertUnwindSafe(|| analyzer.analyze(frame)))
        .unwrap_or_else(|panic| Err(FrameError::TransformFailure(panic_message(panic.as_ref()))));

    // Scratch state may be half-written after a transform failure
    if !matches!(outcome, Err(FrameError::TransformFailure(_))) {
        worker.analyzer = Some((generation, analyzer));
    }

    let publish = {
        let mut slot = shared.lock();
        slot.stats.in_flight -= 1;

        match outcome {
            Ok(result) if slot.generation == generation => {
                slot.stats.published += 1;
                Some(result)
            }
            Ok(_) => {
                slot.stats.stale += 1;
                debug!(sequence, "Discarding result from superseded selection");
                None
            }
            Err(e) => {
                slot.stats.failed += 1;
                match e {
                    FrameError::TransformFailure(_) => {
                        error!(sequence, error = %e, "Frame analysis failed")
                    }
                    _ => warn!(sequence, error = %e, "Dropping malformed frame"),
                }
                None
            }
        }
    };

    if let Some(result) = publish {
        trace!(sequence, filter = %result.filter, "Publishing result");
        (worker.sink)(result);
    }

    LoopAction::Continue
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("filter panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("filter panicked: {}", s)
    } else {
        "filter panicked".to_string()
    }
}
