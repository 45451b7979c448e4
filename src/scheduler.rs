//! Coalescing rebuild scheduler.
//!
//! At most one rebuild runs at a time. Requests that arrive while one is running
//! collapse into a single follow-up execution:
//!
//! ```text
//! Idle ──request──▶ Running ──request──▶ RunningDirty ──request──▶ RunningDirty
//!   ▲                  │                      │
//!   └──── complete ────┘                      └── complete ──▶ Running (follow-up)
//! ```
//!
//! Executions run on their own OS thread. The result travels back over a channel
//! and is applied on the control thread, the one that owns the scheduler, so the
//! state machine itself needs no locking.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};

use crate::metrics::RebuildMetrics;
use crate::services::{FilemapError, FilemapSnapshot};
use crate::state::{FilemapEvent, FilemapState};

/// Name given to every worker thread.
pub const WORKER_THREAD_NAME: &str = "filemap-rebuild";

/// One full rebuild. Called on a worker thread, once per execution.
pub trait RebuildJob: Send + Sync + 'static {
    fn run(&self) -> Result<FilemapSnapshot, FilemapError>;
}

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildState {
    #[default]
    Idle,
    /// An execution is in flight.
    Running,
    /// An execution is in flight and another request arrived after it started.
    RunningDirty,
}

impl RebuildState {
    /// An execution is in flight.
    pub fn is_pending(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// A follow-up execution is owed.
    pub fn is_dirty(self) -> bool {
        matches!(self, Self::RunningDirty)
    }
}

/// What a call to [`RebuildScheduler::request_rebuild`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Started { generation: u64 },
    /// Folded into the follow-up of the running execution.
    Coalesced,
    /// The worker thread could not be spawned; the scheduler stays idle.
    SpawnFailed,
}

/// Message sent from a worker back to the control thread.
#[derive(Debug)]
pub struct RebuildCompletion {
    pub generation: u64,
    pub result: Result<FilemapSnapshot, FilemapError>,
    pub elapsed: Duration,
}

pub struct RebuildScheduler {
    job: Arc<dyn RebuildJob>,
    state: RebuildState,
    last_generation: u64,
    completion_tx: mpsc::UnboundedSender<RebuildCompletion>,
    completion_rx: mpsc::UnboundedReceiver<RebuildCompletion>,
    filemap: FilemapState,
    metrics: Arc<RebuildMetrics>,
}

impl RebuildScheduler {
    pub fn new(job: Arc<dyn RebuildJob>) -> Self {
        Self::with_state(job, FilemapState::new())
    }

    /// Use an existing state holder, e.g. one already handed to readers.
    pub fn with_state(job: Arc<dyn RebuildJob>, filemap: FilemapState) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            job,
            state: RebuildState::Idle,
            last_generation: filemap.generation(),
            completion_tx,
            completion_rx,
            filemap,
            metrics: Arc::new(RebuildMetrics::new()),
        }
    }

    pub fn state(&self) -> RebuildState {
        self.state
    }

    /// Generation of the most recently started execution.
    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }

    pub fn filemap(&self) -> &FilemapState {
        &self.filemap
    }

    pub fn snapshot(&self) -> Arc<FilemapSnapshot> {
        self.filemap.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FilemapEvent> {
        self.filemap.subscribe()
    }

    pub fn metrics(&self) -> Arc<RebuildMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Ask for a rebuild. Never blocks.
    pub fn request_rebuild(&mut self) -> RequestOutcome {
        self.metrics.record_request();

        match self.state {
            RebuildState::Idle => self.start(),
            RebuildState::Running | RebuildState::RunningDirty => {
                if self.state == RebuildState::Running {
                    tracing::debug!(
                        "Rebuild {} in progress, scheduling follow-up",
                        self.last_generation
                    );
                }
                self.state = RebuildState::RunningDirty;
                self.metrics.record_coalesced();
                self.filemap.emit(FilemapEvent::RebuildCoalesced);
                RequestOutcome::Coalesced
            }
        }
    }

    /// The only place an execution is launched.
    fn start(&mut self) -> RequestOutcome {
        let generation = self.last_generation + 1;
        let job = Arc::clone(&self.job);
        let tx = self.completion_tx.clone();

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let start = Instant::now();
                let result = panic::catch_unwind(AssertUnwindSafe(|| job.run()))
                    .unwrap_or_else(|payload| {
                        Err(FilemapError::WorkerPanicked(panic_message(payload.as_ref())))
                    });
                // The scheduler may have been dropped; nothing left to notify.
                let _ = tx.send(RebuildCompletion {
                    generation,
                    result,
                    elapsed: start.elapsed(),
                });
            });

        match spawned {
            Ok(_) => {
                self.last_generation = generation;
                self.state = RebuildState::Running;
                self.metrics.record_started();
                self.filemap.emit(FilemapEvent::RebuildStarted { generation });
                tracing::info!("Rebuild {} started", generation);
                RequestOutcome::Started { generation }
            }
            Err(e) => {
                tracing::error!("Failed to spawn rebuild worker: {}", e);
                self.state = RebuildState::Idle;
                self.filemap
                    .report_failure(generation, format!("Failed to spawn rebuild worker: {e}"));
                RequestOutcome::SpawnFailed
            }
        }
    }

    /// Apply a finished execution: publish or keep the old snapshot, then start
    /// the follow-up if one is owed.
    pub fn handle_completion(&mut self, completion: RebuildCompletion) {
        if !self.state.is_pending() {
            tracing::warn!(
                "Ignoring completion of rebuild {} while idle",
                completion.generation
            );
            return;
        }

        let RebuildCompletion {
            generation,
            result,
            elapsed,
        } = completion;

        match result {
            Ok(mut snapshot) => {
                snapshot.generation = generation;
                self.metrics.record_completed(snapshot.count(), elapsed);
                tracing::info!(
                    "Rebuild {} published {} files in {:.2}ms",
                    generation,
                    snapshot.count(),
                    elapsed.as_secs_f64() * 1000.0
                );
                self.filemap.publish(snapshot);
            }
            Err(e) => {
                self.metrics.record_failed(elapsed);
                tracing::error!(
                    "Rebuild {} failed, keeping generation {}: {}",
                    generation,
                    self.filemap.generation(),
                    e
                );
                self.filemap.report_failure(generation, e.to_string());
            }
        }

        let dirty = self.state.is_dirty();
        self.state = RebuildState::Idle;
        if dirty {
            self.start();
        }
    }

    /// Apply every completion that has already arrived. Returns how many.
    pub fn try_process_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.handle_completion(completion);
            handled += 1;
        }
        handled
    }

    /// Wait for the in-flight execution and apply it. `None` when idle.
    pub async fn next_completion(&mut self) -> Option<u64> {
        if !self.state.is_pending() {
            return None;
        }
        // We hold a sender, so the channel never closes under us.
        let completion = self.completion_rx.recv().await?;
        let generation = completion.generation;
        self.handle_completion(completion);
        Some(generation)
    }

    /// Drive completions, follow-ups included, until the scheduler is idle.
    pub async fn wait_idle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Blocking form of [`wait_idle`](Self::wait_idle) for non-async callers.
    ///
    /// Panics if called from inside an async runtime.
    pub fn blocking_wait_idle(&mut self) {
        while self.state.is_pending() {
            match self.completion_rx.blocking_recv() {
                Some(completion) => self.handle_completion(completion),
                None => break,
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
