//! Scheduler errors.

use thiserror::Error;

use super::launch::{LaunchId, SubtaskFailure};

/// Errors surfaced by a task system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dependency not found: {0}")]
    DependencyNotFound(LaunchId),

    #[error("Cyclic dependency involving {0}")]
    CyclicDependency(LaunchId),

    #[error("{} sub-task(s) failed, first: {}", .failures.len(), first_failure(.failures))]
    RunnableFailed { failures: Vec<SubtaskFailure> },

    #[error("Launch not found: {0}")]
    LaunchNotFound(LaunchId),

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),

    #[error("Task system has been shut down")]
    ShutDown,
}

fn first_failure(failures: &[SubtaskFailure]) -> String {
    failures
        .first()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
