//! Task systems for bulk launches
//!
//! This module provides [`ThreadPoolTaskSystem`], a dependency-aware task
//! system whose worker pool sleeps while there is nothing to run, and
//! [`SerialTaskSystem`], which runs every launch on the submitting thread.
//!
//! # Locking
//!
//! The thread pool keeps two monitors:
//!
//! - the registry monitor (`registry` + `launch_done`), guarding launch
//!   records, readiness counters and barrier state;
//! - the ready-queue monitor (`ready` + `work_available`), guarding the
//!   dispatch cursors and the shutdown flag.
//!
//! Whenever both are needed the registry lock is taken first. Workers drop
//! the ready-queue lock before they execute or report a sub-task.

pub mod error;
pub mod launch;
pub mod queue;
mod readiness;
pub mod registry;
pub mod serial;
pub mod stats;

pub use error::{SchedulerError, SchedulerResult};
pub use launch::{Launch, LaunchId, LaunchSnapshot, LaunchStatus, Runnable, SubtaskFailure, WorkItem};
pub use queue::ReadyQueue;
pub use registry::{Admission, Completion, Dispatch, Registry};
pub use serial::SerialTaskSystem;
pub use stats::SchedulerStats;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use registry::barrier_result;

/// Common interface of every task system.
pub trait TaskSystem {
    /// Diagnostic label of the scheduling strategy.
    fn name(&self) -> &'static str;

    /// Launch `num_total_tasks` sub-tasks and wait for them to finish.
    fn run(
        &self,
        runnable: Arc<dyn Runnable>,
        num_total_tasks: usize,
    ) -> SchedulerResult<()> {
        self.run_async_with_deps(runnable, num_total_tasks, &[])?;
        self.sync()
    }

    /// Launch `num_total_tasks` sub-tasks once every launch in `deps` has
    /// completed. Returns immediately.
    fn run_async_with_deps(
        &self,
        runnable: Arc<dyn Runnable>,
        num_total_tasks: usize,
        deps: &[LaunchId],
    ) -> SchedulerResult<LaunchId>;

    /// Block until every launch submitted before the call has completed.
    fn sync(&self) -> SchedulerResult<()>;
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    pub num_workers: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Worker stack size, platform default when unset.
    pub stack_size: Option<usize>,
}

impl SchedulerConfig {
    /// Default configuration with an explicit worker count.
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Self::default()
        }
    }

    /// Check the configuration before starting a pool.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.num_workers == 0 {
            return Err(SchedulerError::InvalidArgument(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.stack_size == Some(0) {
            return Err(SchedulerError::InvalidArgument(
                "stack_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let num_cpus = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            num_workers: num_cpus,
            thread_name_prefix: "tasksys-worker".to_string(),
            stack_size: None,
        }
    }
}

/// State shared between the pool handle and its workers.
#[derive(Debug)]
struct Shared {
    registry: Mutex<Registry>,
    /// Signalled whenever a launch completes.
    launch_done: Condvar,
    ready: Mutex<ReadyQueue>,
    /// Signalled whenever work is queued or shutdown is requested.
    work_available: Condvar,
    stats: SchedulerStats,
}

impl Shared {
    /// Queue Ready launches and wake workers. Caller holds the registry lock.
    fn enqueue(
        &self,
        dispatches: impl IntoIterator<Item = Dispatch>,
    ) {
        let mut ready = self.ready.lock();
        let mut queued = 0;
        for dispatch in dispatches {
            queued += dispatch.total;
            ready.push(dispatch.launch, dispatch.total, dispatch.runnable);
        }
        drop(ready);

        match queued {
            0 => {}
            1 => {
                self.work_available.notify_one();
            }
            _ => {
                self.work_available.notify_all();
            }
        }
    }

    /// Record a finished sub-task and release whatever it unblocks.
    fn finish(
        &self,
        launch: LaunchId,
        failure: Option<SubtaskFailure>,
    ) {
        let mut registry = self.registry.lock();
        let completion = registry.complete_subtask(launch, failure);
        if !completion.launch_finished {
            return;
        }

        self.stats.record_launch_completed();
        if !completion.promoted.is_empty() {
            trace!(
                "{} released {} launch(es)",
                launch,
                completion.promoted.len()
            );
            self.enqueue(completion.promoted);
        }
        self.launch_done.notify_all();
    }
}

/// Dependency-aware task system backed by a sleeping thread pool.
///
/// Sub-tasks of independent launches run in parallel on a fixed set of
/// workers. A launch is dispatched only after every launch it depends on has
/// fully completed. Idle workers block on a condition variable.
#[derive(Debug)]
pub struct ThreadPoolTaskSystem {
    /// Configuration.
    config: SchedulerConfig,
    /// Registry, ready queue and statistics.
    shared: Arc<Shared>,
    /// Worker threads.
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadPoolTaskSystem {
    /// Create a task system with `num_threads` workers.
    #[inline]
    pub fn new(num_threads: usize) -> SchedulerResult<Self> {
        Self::with_config(SchedulerConfig::with_workers(num_threads))
    }

    /// Create a task system with custom configuration.
    pub fn with_config(config: SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry::new()),
            launch_done: Condvar::new(),
            ready: Mutex::new(ReadyQueue::new()),
            work_available: Condvar::new(),
            stats: SchedulerStats::default(),
        });

        let mut system = Self {
            config,
            shared,
            workers: Vec::new(),
        };
        system.spawn_workers()?;

        info!(
            "Started {} worker(s) ({})",
            system.workers.len(),
            system.config.thread_name_prefix
        );
        Ok(system)
    }

    /// Spawn worker threads.
    ///
    /// On failure the workers already started are shut down when `self` is
    /// dropped by the caller.
    fn spawn_workers(&mut self) -> SchedulerResult<()> {
        self.workers.reserve(self.config.num_workers);

        for worker_id in 0..self.config.num_workers {
            let shared = self.shared.clone();

            let mut builder =
                thread::Builder::new().name(format!("{}-{}", self.config.thread_name_prefix, worker_id));
            if let Some(stack_size) = self.config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            let worker = builder
                .spawn(move || Self::worker_loop(worker_id, &shared))
                .map_err(|e| SchedulerError::WorkerSpawn(e.to_string()))?;

            self.workers.push(worker);
        }

        Ok(())
    }

    /// Worker thread main loop.
    fn worker_loop(
        worker_id: usize,
        shared: &Shared,
    ) {
        trace!("worker {} up", worker_id);

        loop {
            // 1. Sleep until a sub-task can be claimed or shutdown drains the queue
            let item = {
                let mut ready = shared.ready.lock();
                loop {
                    if let Some(item) = ready.claim() {
                        break item;
                    }
                    if ready.is_closed() {
                        trace!("worker {} down", worker_id);
                        return;
                    }
                    shared.work_available.wait(&mut ready);
                }
            };

            // 2. Execute outside every scheduler lock
            let failure = Self::execute(&item, &shared.stats);

            // 3. Release the runnable before waking barrier waiters, then report
            let launch = item.launch;
            drop(item);
            shared.finish(launch, failure);
        }
    }

    /// Run one sub-task, capturing a panic as a failure.
    fn execute(
        item: &WorkItem,
        stats: &SchedulerStats,
    ) -> Option<SubtaskFailure> {
        stats.begin_subtask();
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| item.execute()));

        let failure = outcome.err().map(|payload| SubtaskFailure {
            launch: item.launch,
            index: item.index,
            message: panic_message(payload.as_ref()),
        });
        stats.end_subtask(start.elapsed(), failure.is_some());

        if let Some(failure) = &failure {
            warn!("Sub-task failed: {}", failure);
        }
        failure
    }

    /// Submit a launch of `num_total_tasks` sub-tasks.
    ///
    /// The launch starts once every launch in `deps` has completed. A size of
    /// zero is treated as one.
    pub fn submit(
        &self,
        runnable: Arc<dyn Runnable>,
        num_total_tasks: usize,
        deps: &[LaunchId],
    ) -> SchedulerResult<LaunchId> {
        let mut registry = self.shared.registry.lock();
        let admission = registry.register(runnable, num_total_tasks, deps)?;
        self.shared.stats.record_submitted();

        if let Some(dispatch) = admission.dispatch {
            self.shared.enqueue([dispatch]);
        }

        Ok(admission.id)
    }

    /// Block until launch `id` has completed.
    ///
    /// Returns the failures of that launch not yet reported by a barrier.
    pub fn wait(
        &self,
        id: LaunchId,
    ) -> SchedulerResult<()> {
        let mut registry = self.shared.registry.lock();
        if registry.get(id).is_none() {
            return Err(SchedulerError::LaunchNotFound(id));
        }

        while !registry.status(id).is_some_and(|s| s.is_complete()) {
            self.shared.launch_done.wait(&mut registry);
        }

        barrier_result(registry.take_failures_of(id))
    }

    /// Current state of a launch.
    pub fn status(
        &self,
        id: LaunchId,
    ) -> Option<LaunchStatus> {
        self.shared.registry.lock().status(id)
    }

    /// Read-only view of a launch, including its dispatch cursor.
    pub fn snapshot(
        &self,
        id: LaunchId,
    ) -> Option<LaunchSnapshot> {
        let registry = self.shared.registry.lock();
        let mut snapshot = registry.snapshot(id)?;
        if snapshot.status == LaunchStatus::Ready {
            let ready = self.shared.ready.lock();
            snapshot.dispatched = ready.dispatched(id).unwrap_or(snapshot.total);
        }
        Some(snapshot)
    }

    /// Number of launches not yet complete.
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.shared.registry.lock().outstanding()
    }

    /// Number of sub-tasks waiting for a worker.
    #[inline]
    pub fn pending_subtasks(&self) -> usize {
        self.shared.ready.lock().pending()
    }

    /// Get statistics.
    #[inline]
    pub fn stats(&self) -> &SchedulerStats {
        &self.shared.stats
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Get the number of workers.
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Check if the worker pool is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        !self.workers.is_empty()
    }

    /// Drain outstanding launches, stop and join every worker.
    ///
    /// Submissions fail with [`SchedulerError::ShutDown`] afterwards. Failures
    /// of launches nobody synced on are logged and dropped.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }

        {
            let mut registry = self.shared.registry.lock();
            registry.close();
            while registry.outstanding() > 0 {
                self.shared.launch_done.wait(&mut registry);
            }
            let watermark = registry.next_id();
            let dropped = registry.take_failures_below(watermark);
            if !dropped.is_empty() {
                warn!("{} sub-task failure(s) never reported", dropped.len());
            }
        }

        self.shared.ready.lock().close();
        self.shared.work_available.notify_all();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("Worker thread panicked outside a sub-task");
            }
        }
        debug!("Worker pool stopped");
    }
}

impl TaskSystem for ThreadPoolTaskSystem {
    fn name(&self) -> &'static str {
        "Parallel + Thread Pool + Sleep"
    }

    fn run_async_with_deps(
        &self,
        runnable: Arc<dyn Runnable>,
        num_total_tasks: usize,
        deps: &[LaunchId],
    ) -> SchedulerResult<LaunchId> {
        self.submit(runnable, num_total_tasks, deps)
    }

    fn sync(&self) -> SchedulerResult<()> {
        let mut registry = self.shared.registry.lock();
        let watermark = registry.next_id();

        while !registry.all_complete_below(watermark) {
            self.shared.launch_done.wait(&mut registry);
        }

        barrier_result(registry.take_failures_below(watermark))
    }
}

impl Drop for ThreadPoolTaskSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests;
