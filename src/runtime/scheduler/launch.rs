//! Launch definitions for the scheduler.
//!
//! A launch is one bulk submission: a [`Runnable`] applied independently to
//! every index in `0..total`. This module defines the launch identifier, its
//! lifecycle states and the record the registry keeps for each launch.

use std::fmt;
use std::sync::Arc;

/// Unit of work supplied by the caller.
///
/// `run_task` is invoked once for every index of a launch, possibly from
/// several worker threads at the same time for different indices.
pub trait Runnable: Send + Sync {
    /// Execute sub-task `index` out of `total`.
    fn run_task(
        &self,
        index: usize,
        total: usize,
    );
}

impl<F> Runnable for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    #[inline]
    fn run_task(
        &self,
        index: usize,
        total: usize,
    ) {
        self(index, total)
    }
}

/// Unique launch identifier.
///
/// Identifiers are handed out in submission order, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaunchId(pub usize);

impl LaunchId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl From<usize> for LaunchId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl From<LaunchId> for usize {
    fn from(val: LaunchId) -> Self {
        val.0
    }
}

impl fmt::Display for LaunchId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Launch({})", self.0)
    }
}

/// Launch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// At least one dependency has not completed yet.
    Waiting,
    /// Dependencies satisfied; sub-tasks may be dispatched.
    Ready,
    /// Every sub-task has finished.
    Complete,
}

impl LaunchStatus {
    /// Check whether the launch has finished.
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, LaunchStatus::Complete)
    }
}

/// A sub-task whose runnable panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskFailure {
    /// Owning launch.
    pub launch: LaunchId,
    /// Sub-task index within the launch.
    pub index: usize,
    /// Panic payload rendered as text.
    pub message: String,
}

impl fmt::Display for SubtaskFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.launch, self.index, self.message)
    }
}

/// One dispatchable sub-task, claimed by exactly one worker.
#[derive(Clone)]
pub struct WorkItem {
    pub launch: LaunchId,
    pub index: usize,
    pub total: usize,
    pub runnable: Arc<dyn Runnable>,
}

impl WorkItem {
    /// Run the sub-task on the current thread.
    #[inline]
    pub fn execute(&self) {
        self.runnable.run_task(self.index, self.total);
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("launch", &self.launch)
            .field("index", &self.index)
            .field("total", &self.total)
            .finish()
    }
}

/// Registry record of a single launch.
pub struct Launch {
    /// Launch ID.
    pub(crate) id: LaunchId,
    /// Number of sub-tasks, always at least one.
    pub(crate) total: usize,
    /// Sub-tasks that finished executing.
    pub(crate) completed: usize,
    /// Declared dependencies, deduplicated.
    pub(crate) dependencies: Vec<LaunchId>,
    /// Dependencies that have not completed yet.
    pub(crate) pending_deps: usize,
    /// Launches waiting on this one.
    pub(crate) dependents: Vec<LaunchId>,
    /// Current state.
    pub(crate) status: LaunchStatus,
    /// The work to execute, handed off on promotion.
    pub(crate) runnable: Option<Arc<dyn Runnable>>,
    /// Number of panicked sub-tasks.
    pub(crate) failed: usize,
}

impl fmt::Debug for Launch {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Launch")
            .field("id", &self.id)
            .field("total", &self.total)
            .field("completed", &self.completed)
            .field("dependencies", &self.dependencies)
            .field("pending_deps", &self.pending_deps)
            .field("status", &self.status)
            .finish()
    }
}

impl Launch {
    pub(crate) fn new(
        id: LaunchId,
        total: usize,
        dependencies: Vec<LaunchId>,
        runnable: Arc<dyn Runnable>,
    ) -> Self {
        Self {
            id,
            total,
            completed: 0,
            dependencies,
            pending_deps: 0,
            dependents: Vec::new(),
            status: LaunchStatus::Waiting,
            runnable: Some(runnable),
            failed: 0,
        }
    }

    /// Get the launch ID.
    #[inline]
    pub fn id(&self) -> LaunchId {
        self.id
    }

    /// Get the number of sub-tasks.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get the current state.
    #[inline]
    pub fn status(&self) -> LaunchStatus {
        self.status
    }

    /// Check if the launch is finished.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Capture a read-only view of the record.
    ///
    /// The registry does not see the dispatch cursor of a Ready launch, so
    /// `dispatched` is reported as its lower bound (`completed`) in that
    /// state.
    pub fn snapshot(&self) -> LaunchSnapshot {
        let dispatched = match self.status {
            LaunchStatus::Waiting => 0,
            LaunchStatus::Ready => self.completed,
            LaunchStatus::Complete => self.total,
        };
        LaunchSnapshot {
            id: self.id,
            total: self.total,
            completed: self.completed,
            dispatched,
            dependencies: self.dependencies.clone(),
            status: self.status,
            failures: self.failed,
        }
    }
}

/// Point-in-time copy of a launch's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSnapshot {
    pub id: LaunchId,
    pub total: usize,
    pub completed: usize,
    pub dispatched: usize,
    pub dependencies: Vec<LaunchId>,
    pub status: LaunchStatus,
    pub failures: usize,
}
