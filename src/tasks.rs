//! Single-flight background task execution.
//!
//! Ingestion and query work runs off the caller's thread on the blocking
//! pool. At most one task is in flight per runner; submitting while busy is
//! rejected rather than queued, so the caller always knows whether its work
//! was accepted.

use crate::error::{DuckboardError, Result};
use std::fmt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What kind of work a task performs. Used for busy messages and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Load,
    Query,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a background task.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Succeeded(T),
    Failed(String),
}

struct InFlight<T> {
    kind: TaskKind,
    rx: oneshot::Receiver<TaskOutcome<T>>,
}

/// Runs one background task at a time.
///
/// Not internally synchronized; callers hold it behind whatever guards the
/// owning component already uses.
pub struct TaskRunner<T> {
    in_flight: Option<InFlight<T>>,
}

impl<T: Send + 'static> TaskRunner<T> {
    pub fn new() -> Self {
        Self { in_flight: None }
    }

    /// True while a submitted task has not yet reported an outcome.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Submits a task for background execution.
    ///
    /// Fails with a busy error when a previous task is still in flight. The
    /// closure's error is stringified into `TaskOutcome::Failed`; a panic in
    /// the closure surfaces as a failed outcome as well, because the sender
    /// is dropped without sending.
    pub fn submit<F>(&mut self, kind: TaskKind, op: F) -> Result<()>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        if let Some(current) = &self.in_flight {
            return Err(DuckboardError::busy(format!(
                "a {} task is already running",
                current.kind
            )));
        }

        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let outcome = match op() {
                Ok(value) => TaskOutcome::Succeeded(value),
                Err(e) => TaskOutcome::Failed(e.to_string()),
            };
            // The receiver may have been dropped; nothing to do then.
            let _ = tx.send(outcome);
        });

        debug!(kind = %kind, "background task submitted");
        self.in_flight = Some(InFlight { kind, rx });
        Ok(())
    }

    /// Polls for a completed outcome without blocking.
    ///
    /// Returns `None` while the task is still running. Once an outcome is
    /// returned the runner is idle again.
    pub fn try_poll(&mut self) -> Option<TaskOutcome<T>> {
        let current = self.in_flight.as_mut()?;
        match current.rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = None;
                Some(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!(kind = %current.kind, "background task worker terminated");
                self.in_flight = None;
                Some(TaskOutcome::Failed(
                    "worker terminated before reporting an outcome".to_string(),
                ))
            }
        }
    }

    /// Waits for the in-flight task to finish and returns its outcome.
    ///
    /// Returns `None` when no task is in flight. The in-flight slot is
    /// cleared only once an outcome is in hand; dropping this future
    /// mid-wait leaves the runner busy and a later call can resume waiting.
    pub async fn wait(&mut self) -> Option<TaskOutcome<T>> {
        let current = self.in_flight.as_mut()?;
        let kind = current.kind;
        let result = (&mut current.rx).await;
        self.in_flight = None;
        match result {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(kind = %kind, "background task worker terminated");
                Some(TaskOutcome::Failed(
                    "worker terminated before reporting an outcome".to_string(),
                ))
            }
        }
    }
}

impl<T: Send + 'static> Default for TaskRunner<T> {
    fn default() -> Self {
        Self::new()
    }
}
