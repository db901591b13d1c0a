//! Ready queue for the scheduler
//!
//! Holds the launches whose dependencies are satisfied and hands out their
//! sub-tasks one index at a time. The queue itself is not synchronized; the
//! task system keeps it behind a mutex paired with the worker condvar.

use std::collections::VecDeque;
use std::sync::Arc;

use super::launch::{LaunchId, Runnable, WorkItem};

/// Dispatch cursor of one Ready launch.
struct ReadyEntry {
    launch: LaunchId,
    total: usize,
    /// Indices already handed to a worker.
    dispatched: usize,
    runnable: Arc<dyn Runnable>,
}

/// FIFO of Ready launches.
///
/// Launches are admitted in promotion order and each launch's indices are
/// dispatched in ascending order.
pub struct ReadyQueue {
    entries: VecDeque<ReadyEntry>,
    shutdown: bool,
}

impl ReadyQueue {
    /// Create a new empty ready queue.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            shutdown: false,
        }
    }

    /// Admit a Ready launch with all of its indices undispatched.
    pub fn push(
        &mut self,
        launch: LaunchId,
        total: usize,
        runnable: Arc<dyn Runnable>,
    ) {
        assert!(total > 0, "{} admitted with no sub-tasks", launch);
        self.entries.push_back(ReadyEntry {
            launch,
            total,
            dispatched: 0,
            runnable,
        });
    }

    /// Claim the next undispatched sub-task.
    ///
    /// The entry is retired as soon as its last index is handed out, so an
    /// index can never be claimed twice.
    pub fn claim(&mut self) -> Option<WorkItem> {
        let entry = self.entries.front_mut()?;
        let index = entry.dispatched;
        entry.dispatched += 1;

        let item = WorkItem {
            launch: entry.launch,
            index,
            total: entry.total,
            runnable: entry.runnable.clone(),
        };

        if entry.dispatched == entry.total {
            self.entries.pop_front();
        }

        Some(item)
    }

    /// Number of sub-tasks still waiting for a worker.
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.total - e.dispatched)
            .sum()
    }

    /// Number of launches with undispatched work.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is left to dispatch.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch count of a queued launch, if it is still queued.
    pub fn dispatched(
        &self,
        launch: LaunchId,
    ) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.launch == launch)
            .map(|e| e.dispatched)
    }

    /// Request shutdown; workers exit once the queue drains.
    #[inline]
    pub fn close(&mut self) {
        self.shutdown = true;
    }

    /// Check if shutdown was requested.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.shutdown
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReadyQueue {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ReadyQueue")
            .field("launches", &self.entries.len())
            .field("pending", &self.pending())
            .field("shutdown", &self.shutdown)
            .finish()
    }
}
