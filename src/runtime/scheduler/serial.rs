//! Serial task system.
//!
//! Runs each launch on the submitting thread as soon as it becomes Ready,
//! including dependents it releases along the way. It shares the registry
//! with the thread pool, so ids, validation and failure reporting behave the
//! same; it serves as the reference result in tests and benchmarks.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use super::error::SchedulerResult;
use super::launch::{LaunchId, LaunchStatus, Runnable, SubtaskFailure};
use super::registry::{barrier_result, Dispatch, Registry};
use super::{panic_message, TaskSystem};

/// Task system without worker threads.
#[derive(Debug, Default)]
pub struct SerialTaskSystem {
    registry: Mutex<Registry>,
    launch_done: Condvar,
}

impl SerialTaskSystem {
    /// Create a serial task system.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a launch.
    pub fn status(
        &self,
        id: LaunchId,
    ) -> Option<LaunchStatus> {
        self.registry.lock().status(id)
    }

    /// Execute a Ready launch and every launch it transitively releases.
    fn drive(
        &self,
        first: Dispatch,
    ) {
        let mut work = VecDeque::from([first]);

        while let Some(dispatch) = work.pop_front() {
            for index in 0..dispatch.total {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    dispatch.runnable.run_task(index, dispatch.total)
                }));
                let failure = outcome.err().map(|payload| SubtaskFailure {
                    launch: dispatch.launch,
                    index,
                    message: panic_message(payload.as_ref()),
                });
                if let Some(failure) = &failure {
                    warn!("Sub-task failed: {}", failure);
                }

                let mut registry = self.registry.lock();
                let completion = registry.complete_subtask(dispatch.launch, failure);
                if completion.launch_finished {
                    work.extend(completion.promoted);
                    self.launch_done.notify_all();
                }
            }
        }
    }
}

impl TaskSystem for SerialTaskSystem {
    fn name(&self) -> &'static str {
        "Serial"
    }

    fn run_async_with_deps(
        &self,
        runnable: Arc<dyn Runnable>,
        num_total_tasks: usize,
        deps: &[LaunchId],
    ) -> SchedulerResult<LaunchId> {
        let admission = self
            .registry
            .lock()
            .register(runnable, num_total_tasks, deps)?;

        if let Some(dispatch) = admission.dispatch {
            self.drive(dispatch);
        }
        Ok(admission.id)
    }

    fn sync(&self) -> SchedulerResult<()> {
        let mut registry = self.registry.lock();
        let watermark = registry.next_id();

        while !registry.all_complete_below(watermark) {
            self.launch_done.wait(&mut registry);
        }

        barrier_result(registry.take_failures_below(watermark))
    }
}
