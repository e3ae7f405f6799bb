//! Worker fan-out
//!
//! One OS thread per [`WorkBatch`], each running its own single-threaded
//! tokio runtime. Workers share nothing mutable; they only send
//! [`WorkerMessage`]s back over an unbounded channel. There is no work
//! stealing, cancellation or per-worker timeout.
//!
//! ```text
//!            ┌──────────── coordinator ────────────┐
//!            │   mpsc::UnboundedReceiver<Message>  │
//!            └──────▲──────────▲──────────▲────────┘
//!                   │          │          │
//!              worker 0   worker 1   worker N-1
//!            (thread + current_thread runtime)
//! ```

pub mod jobs;
pub mod status;

use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::scheduler::{Distribution, WorkBatch};

pub use jobs::{JobContext, JobKind};
pub use status::{StatusSender, WorkerMessage, WorkerStatus};

/// What the coordinator observed while the pool ran
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Workers that were spawned
    pub workers: usize,

    /// Workers whose runtime came up
    pub started: usize,

    /// `Done` keys in arrival order
    pub done: Vec<String>,

    /// `(worker, detail)` of every `Error` message
    pub errors: Vec<(usize, String)>,

    /// Number of `Progress` messages
    pub progress: usize,

    /// Workers whose thread panicked
    pub panicked: Vec<usize>,
}

impl PoolReport {
    /// Fold one message into the report
    pub fn record(&mut self, message: &WorkerMessage) {
        match &message.status {
            WorkerStatus::Started { .. } => self.started += 1,
            WorkerStatus::Progress { .. } => self.progress += 1,
            WorkerStatus::Done { key } => self.done.push(key.clone()),
            WorkerStatus::Error { detail } => self.errors.push((message.worker, detail.clone())),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.panicked.is_empty()
    }
}

/// Spawns one worker per batch and collects their status messages
pub struct WorkerPool {
    kind: JobKind,
    ctx: Arc<JobContext>,
}

impl WorkerPool {
    pub fn new(kind: JobKind, ctx: JobContext) -> Self {
        Self {
            kind,
            ctx: Arc::new(ctx),
        }
    }

    /// Run all batches of `distribution` to completion
    pub async fn run(&self, distribution: Distribution) -> Result<PoolReport> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut report = PoolReport::default();
        let mut handles = Vec::with_capacity(distribution.batches.len());

        if distribution.batches.is_empty() {
            info!(kind = %self.kind, "Nothing to distribute");
        } else if let Some((dir, template)) = self.kind.export_template() {
            let notes = self.ctx.exporter.child(dir).write_column_notes(&template)?;
            debug!(path = %notes.display(), "Column notes written");
        }

        for batch in distribution.batches {
            let index = batch.index;
            let handle = spawn_worker(self.kind, Arc::clone(&self.ctx), batch, tx.clone())?;
            handles.push((index, handle));
        }
        report.workers = handles.len();
        info!(kind = %self.kind, workers = report.workers, "Workers spawned");

        // The channel closes once every worker has dropped its sender
        drop(tx);
        drain(rx, &mut report).await;

        let joined = tokio::task::spawn_blocking(move || {
            handles
                .into_iter()
                .filter_map(|(index, handle)| handle.join().is_err().then_some(index))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| crate::error::Error::with_source("Failed to join workers", e))?;

        for index in &joined {
            error!(worker = index, "Worker panicked");
        }
        report.panicked = joined;

        info!(
            kind = %self.kind,
            done = report.done.len(),
            errors = report.errors.len(),
            panicked = report.panicked.len(),
            "All workers finished"
        );

        Ok(report)
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<WorkerMessage>, report: &mut PoolReport) {
    while let Some(message) = rx.recv().await {
        match &message.status {
            WorkerStatus::Error { detail } => {
                warn!(worker = message.worker, detail = %detail, "Worker error")
            }
            status => info!(worker = message.worker, "{status}"),
        }
        report.record(&message);
    }
}

/// Start one worker thread with its own current-thread runtime
fn spawn_worker(
    kind: JobKind,
    ctx: Arc<JobContext>,
    batch: WorkBatch,
    tx: mpsc::UnboundedSender<WorkerMessage>,
) -> Result<JoinHandle<()>> {
    let index = batch.index;
    let handle = std::thread::Builder::new()
        .name(format!("harvest-worker-{index}"))
        .spawn(move || {
            let status = StatusSender::new(index, tx);
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    status.error(format!("failed to start runtime: {e}"));
                    return;
                }
            };

            runtime.block_on(jobs::run_batch(kind, &ctx, batch, &status));
        })?;

    Ok(handle)
}
