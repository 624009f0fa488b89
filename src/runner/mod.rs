pub mod events;
pub mod guard;
pub mod pipeline;

pub use events::{FileStatus, RunEvent, RunOutcome};
pub use guard::{CompletionStatus, RunGuard, RunPermit, RunState};
pub use pipeline::{Pipeline, RunPlan};

use crate::config::Config;
use crate::error::{Result, TitleGrabError, UserFriendlyError};
use crate::extractor::RunSummary;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Starts runs on a blocking worker and enforces that only one is active at a time.
#[derive(Clone)]
pub struct Runner {
    config: Arc<Config>,
    guard: RunGuard,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            guard: RunGuard::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.guard.state()
    }

    /// Dispatches a run over `directory` and returns immediately.
    ///
    /// Must be called from within a Tokio runtime. Fails with `RunInProgress` while another
    /// run started from this runner (or a clone of it) has not completed.
    pub fn begin_run<P: Into<PathBuf>>(&self, directory: P) -> Result<RunHandle> {
        let permit = self.guard.try_start()?;
        let directory = directory.into();
        let config = Arc::clone(&self.config);
        let (sender, receiver) = mpsc::unbounded_channel();

        let task = tokio::task::spawn_blocking(move || {
            let pipeline = Pipeline::new(&config);
            complete_run(permit, sender, |emit| pipeline.execute(&directory, emit))
        });

        Ok(RunHandle {
            events: receiver,
            task,
        })
    }
}

/// Runs `work` and always finishes with exactly one `RunCompleted`, even if `work` panics.
/// The guard is released before that event goes out.
fn complete_run<W>(
    permit: RunPermit,
    sender: mpsc::UnboundedSender<RunEvent>,
    work: W,
) -> Result<RunSummary>
where
    W: FnOnce(&mut dyn FnMut(RunEvent)) -> Result<RunSummary>,
{
    // The consumer may have stopped listening; the run still finishes.
    let mut emit = |event: RunEvent| {
        let _ = sender.send(event);
    };

    let result = match panic::catch_unwind(AssertUnwindSafe(|| work(&mut emit))) {
        Ok(result) => result,
        Err(payload) => Err(TitleGrabError::Worker {
            message: panic_message(&*payload),
        }),
    };

    let (status, outcome) = match &result {
        Ok(summary) => (
            CompletionStatus::Success,
            RunOutcome::Success {
                summary: summary.clone(),
            },
        ),
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            (
                CompletionStatus::Failure,
                RunOutcome::Failure {
                    message: err.user_message(),
                    suggestion: err.suggestion(),
                },
            )
        }
    };

    permit.complete(status);
    let _ = sender.send(RunEvent::RunCompleted { outcome });

    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Receiving side of an active run.
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<RunEvent>,
    task: JoinHandle<Result<RunSummary>>,
}

impl RunHandle {
    /// Next event, or `None` once the worker has finished and every event was consumed.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Waits for the worker and returns the run's final result.
    pub async fn finish(self) -> Result<RunSummary> {
        self.task.await.map_err(|e| TitleGrabError::Worker {
            message: e.to_string(),
        })?
    }
}
