use crate::error::{Result, TitleGrabError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Success,
    Failure,
}

/// Lifecycle of the single run a process may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed(CompletionStatus),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Shared single-flight guard. Clones observe and control the same state.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    state: Arc<Mutex<RunState>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        *self.lock()
    }

    /// Moves to `Running` unless a run is already active.
    pub fn try_start(&self) -> Result<RunPermit> {
        let mut state = self.lock();
        if state.is_running() {
            return Err(TitleGrabError::RunInProgress);
        }
        *state = RunState::Running;

        Ok(RunPermit {
            guard: self.clone(),
            completed: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by the active run. Dropping it without completing marks the run failed.
#[derive(Debug)]
pub struct RunPermit {
    guard: RunGuard,
    completed: bool,
}

impl RunPermit {
    pub fn complete(mut self, status: CompletionStatus) {
        *self.guard.lock() = RunState::Completed(status);
        self.completed = true;
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        if !self.completed {
            *self.guard.lock() = RunState::Completed(CompletionStatus::Failure);
        }
    }
}
