//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam::utils::CachePadded;

/// Counters updated by submitters and workers.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Total launches admitted.
    pub launches_submitted: AtomicUsize,
    /// Total launches that reached Complete.
    pub launches_completed: AtomicUsize,
    /// Total sub-tasks executed.
    pub subtasks_executed: AtomicUsize,
    /// Sub-tasks whose runnable panicked.
    pub subtasks_failed: AtomicUsize,
    /// Total execution time in microseconds.
    pub total_exec_time_us: AtomicU64,
    /// Sub-tasks executing right now.
    pub active: CachePadded<AtomicUsize>,
    /// Peak number of concurrently executing sub-tasks.
    pub peak_parallelism: CachePadded<AtomicUsize>,
}

impl SchedulerStats {
    /// Record an admitted launch.
    #[inline]
    pub fn record_submitted(&self) {
        self.launches_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished launch.
    #[inline]
    pub fn record_launch_completed(&self) {
        self.launches_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a sub-task as started.
    #[inline]
    pub fn begin_subtask(&self) {
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_parallelism(current);
    }

    /// Mark a sub-task as finished.
    #[inline]
    pub fn end_subtask(
        &self,
        duration: Duration,
        failed: bool,
    ) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.subtasks_executed.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        // Saturates instead of wrapping
        let _ = self
            .total_exec_time_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(micros))
            });
        if failed {
            self.subtasks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Update parallelism.
    #[inline]
    pub fn update_parallelism(
        &self,
        current: usize,
    ) {
        let mut peak = self.peak_parallelism.load(Ordering::SeqCst);
        while current > peak {
            match self.peak_parallelism.compare_exchange_weak(
                peak,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
    }

    /// Average execution time per sub-task.
    pub fn mean_exec_time(&self) -> Duration {
        let executed = self.subtasks_executed.load(Ordering::Relaxed);
        if executed == 0 {
            return Duration::ZERO;
        }
        let total = self.total_exec_time_us.load(Ordering::Relaxed);
        Duration::from_micros(total / executed as u64)
    }
}
