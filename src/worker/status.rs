//! Status messages sent from workers to the coordinator

use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Progress report of one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    /// The worker runtime is up and holds this many assignments
    Started { assignments: usize },
    /// `of` out of `total` steps of `unit` are finished
    Progress { unit: String, of: usize, total: usize },
    /// A unit finished; `key` names it (role, proxy key)
    Done { key: String },
    /// A unit or the whole worker failed
    Error { detail: String },
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { assignments } => write!(f, "started with {assignments} assignments"),
            Self::Progress { unit, of, total } => write!(f, "progress of {unit} | {of}/{total}"),
            Self::Done { key } => write!(f, "done for {key}"),
            Self::Error { detail } => write!(f, "error: {detail}"),
        }
    }
}

/// Status tagged with the worker that sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMessage {
    pub worker: usize,
    pub status: WorkerStatus,
}

/// Sending half owned by one worker
#[derive(Debug, Clone)]
pub struct StatusSender {
    worker: usize,
    tx: UnboundedSender<WorkerMessage>,
}

impl StatusSender {
    pub fn new(worker: usize, tx: UnboundedSender<WorkerMessage>) -> Self {
        Self { worker, tx }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Send a status; a closed coordinator is not an error for the worker
    pub fn send(&self, status: WorkerStatus) {
        let message = WorkerMessage {
            worker: self.worker,
            status,
        };
        if self.tx.send(message).is_err() {
            tracing::debug!(worker = self.worker, "Coordinator gone, status dropped");
        }
    }

    pub fn progress(&self, unit: impl Into<String>, of: usize, total: usize) {
        self.send(WorkerStatus::Progress {
            unit: unit.into(),
            of,
            total,
        });
    }

    pub fn done(&self, key: impl Into<String>) {
        self.send(WorkerStatus::Done { key: key.into() });
    }

    pub fn error(&self, detail: impl fmt::Display) {
        self.send(WorkerStatus::Error {
            detail: detail.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_status_display() {
        let status = WorkerStatus::Progress {
            unit: "96".to_string(),
            of: 3,
            total: 20,
        };
        assert_eq!(status.to_string(), "progress of 96 | 3/20");
        assert_eq!(
            WorkerStatus::Done {
                key: "96".to_string()
            }
            .to_string(),
            "done for 96"
        );
    }

    #[test]
    fn test_sender_tags_worker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = StatusSender::new(4, tx);
        sender.done("10.0.0.1_8000");

        let message = rx.try_recv().unwrap();
        assert_eq!(message.worker, 4);
        assert_eq!(
            message.status,
            WorkerStatus::Done {
                key: "10.0.0.1_8000".to_string()
            }
        );
    }

    #[test]
    fn test_send_after_close_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        StatusSender::new(0, tx).error("boom");
    }
}
