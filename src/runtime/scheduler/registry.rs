//! Launch registry
//!
//! Owns every launch record for the lifetime of a task system. Records live
//! in an arena indexed by [`LaunchId`], so the number of launches is bounded
//! only by memory. The registry is not synchronized on its own: task systems
//! keep it behind the registry monitor, and every launch transition
//! (admission, completion, promotion) happens under that one lock.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::error::{SchedulerError, SchedulerResult};
use super::launch::{Launch, LaunchId, LaunchSnapshot, LaunchStatus, Runnable, SubtaskFailure};

/// A launch whose sub-tasks may be handed to workers.
pub struct Dispatch {
    pub launch: LaunchId,
    pub total: usize,
    pub runnable: Arc<dyn Runnable>,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("launch", &self.launch)
            .field("total", &self.total)
            .finish()
    }
}

/// Outcome of admitting a launch.
#[derive(Debug)]
pub struct Admission {
    /// Assigned identifier.
    pub id: LaunchId,
    /// Present when the launch is Ready at submission.
    pub dispatch: Option<Dispatch>,
}

/// Outcome of recording one finished sub-task.
#[derive(Debug, Default)]
pub struct Completion {
    /// The sub-task was the last one of its launch.
    pub launch_finished: bool,
    /// Dependents that became Ready as a result.
    pub promoted: Vec<Dispatch>,
}

/// Arena of launch records plus the barrier bookkeeping.
#[derive(Debug, Default)]
pub struct Registry {
    /// Launch records, `launches[i].id == LaunchId(i)`.
    pub(crate) launches: Vec<Launch>,
    /// Launches not yet Complete.
    pub(crate) incomplete: BTreeSet<LaunchId>,
    /// Failures not yet returned by a barrier.
    pub(crate) unreported: Vec<SubtaskFailure>,
    closed: bool,
}

impl Registry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the next admitted launch will receive.
    #[inline]
    pub fn next_id(&self) -> LaunchId {
        LaunchId(self.launches.len())
    }

    /// Number of launches ever admitted.
    #[inline]
    pub fn len(&self) -> usize {
        self.launches.len()
    }

    /// Check if no launch was admitted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.launches.is_empty()
    }

    /// Number of launches not yet Complete.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.incomplete.len()
    }

    /// Look up a launch record.
    #[inline]
    pub fn get(
        &self,
        id: LaunchId,
    ) -> Option<&Launch> {
        self.launches.get(id.0)
    }

    /// Current state of a launch.
    #[inline]
    pub fn status(
        &self,
        id: LaunchId,
    ) -> Option<LaunchStatus> {
        self.get(id).map(Launch::status)
    }

    /// Read-only view of a launch.
    #[inline]
    pub fn snapshot(
        &self,
        id: LaunchId,
    ) -> Option<LaunchSnapshot> {
        self.get(id).map(Launch::snapshot)
    }

    /// Refuse further admissions.
    #[inline]
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Check if admissions are refused.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Admit a new launch.
    ///
    /// A launch size of zero is normalized to one. Dependencies must name
    /// launches already admitted; duplicates are ignored. A rejected launch
    /// consumes no identifier.
    ///
    /// Identifiers only grow and every dependency is admitted before its
    /// dependent, so each edge points to a lower id and the graph is acyclic
    /// without any traversal.
    pub fn register(
        &mut self,
        runnable: Arc<dyn Runnable>,
        total: usize,
        dependencies: &[LaunchId],
    ) -> SchedulerResult<Admission> {
        if self.closed {
            return Err(SchedulerError::ShutDown);
        }

        let id = self.next_id();
        let total = total.max(1);

        let mut deps = dependencies.to_vec();
        deps.sort_unstable();
        deps.dedup();

        for &dep in &deps {
            if dep == id {
                return Err(SchedulerError::CyclicDependency(id));
            }
            if self.get(dep).is_none() {
                return Err(SchedulerError::DependencyNotFound(dep));
            }
            debug_assert!(dep < id, "{} depends on later {}", id, dep);
        }

        self.launches.push(Launch::new(id, total, deps, runnable));
        self.incomplete.insert(id);

        let dispatch = self.classify(id);
        debug!(
            "{} admitted: {} sub-task(s), {}",
            id,
            total,
            if dispatch.is_some() { "ready" } else { "waiting" }
        );

        Ok(Admission { id, dispatch })
    }

    /// Check whether every launch below `watermark` is Complete.
    #[inline]
    pub fn all_complete_below(
        &self,
        watermark: LaunchId,
    ) -> bool {
        self.incomplete
            .first()
            .map_or(true, |oldest| *oldest >= watermark)
    }

    /// Drain unreported failures of launches below `watermark`.
    pub fn take_failures_below(
        &mut self,
        watermark: LaunchId,
    ) -> Vec<SubtaskFailure> {
        self.take_failures(|f| f.launch < watermark)
    }

    /// Drain unreported failures of one launch.
    pub fn take_failures_of(
        &mut self,
        launch: LaunchId,
    ) -> Vec<SubtaskFailure> {
        self.take_failures(|f| f.launch == launch)
    }

    fn take_failures(
        &mut self,
        mut matches: impl FnMut(&SubtaskFailure) -> bool,
    ) -> Vec<SubtaskFailure> {
        if self.unreported.is_empty() {
            return Vec::new();
        }
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.unreported)
            .into_iter()
            .partition(|f| matches(f));
        self.unreported = kept;
        taken
    }
}

/// Turn a drained failure list into a barrier result.
pub(crate) fn barrier_result(failures: Vec<SubtaskFailure>) -> SchedulerResult<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SchedulerError::RunnableFailed { failures })
    }
}
