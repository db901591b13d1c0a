//! Readiness tracking
//!
//! Each launch counts its incomplete dependencies. Admission registers a
//! Waiting launch as a dependent of every dependency that is still running;
//! the completion of a launch decrements the counter of each dependent and
//! promotes those that reach zero. Both steps run under the registry lock,
//! so a dependency can never complete between being inspected by an
//! admission and having the new dependent recorded.

use tracing::{debug, trace};

use super::launch::{LaunchId, LaunchStatus, SubtaskFailure};
use super::registry::{Completion, Dispatch, Registry};

impl Registry {
    /// Classify a freshly admitted launch as Ready or Waiting.
    ///
    /// Returns the dispatch for a launch that is Ready right away.
    pub(crate) fn classify(
        &mut self,
        id: LaunchId,
    ) -> Option<Dispatch> {
        let deps = self.launches[id.0].dependencies.clone();

        let mut pending = 0;
        for dep in deps {
            let record = &mut self.launches[dep.0];
            if !record.is_complete() {
                record.dependents.push(id);
                pending += 1;
            }
        }

        let record = &mut self.launches[id.0];
        record.pending_deps = pending;
        if pending == 0 {
            Some(self.promote(id))
        } else {
            trace!("{} waits on {} launch(es)", id, pending);
            None
        }
    }

    /// Record one finished sub-task of `launch`.
    ///
    /// The last sub-task marks the launch Complete and promotes every
    /// dependent whose dependencies are now all Complete.
    pub(crate) fn complete_subtask(
        &mut self,
        launch: LaunchId,
        failure: Option<SubtaskFailure>,
    ) -> Completion {
        let record = &mut self.launches[launch.0];
        assert_eq!(
            record.status,
            LaunchStatus::Ready,
            "{} completed a sub-task while not Ready",
            launch
        );
        assert!(
            record.completed < record.total,
            "{} completed more sub-tasks than it has",
            launch
        );

        record.completed += 1;
        if let Some(failure) = failure {
            record.failed += 1;
            self.unreported.push(failure);
        }

        let record = &mut self.launches[launch.0];
        if record.completed < record.total {
            return Completion::default();
        }

        record.status = LaunchStatus::Complete;
        let dependents = std::mem::take(&mut record.dependents);
        self.incomplete.remove(&launch);
        debug!("{} complete", launch);

        let mut promoted = Vec::new();
        for dependent in dependents {
            let record = &mut self.launches[dependent.0];
            assert!(
                record.pending_deps > 0,
                "{} released more dependencies than it declared",
                dependent
            );
            record.pending_deps -= 1;
            if record.pending_deps == 0 {
                promoted.push(self.promote(dependent));
            }
        }

        Completion {
            launch_finished: true,
            promoted,
        }
    }

    /// Waiting -> Ready.
    ///
    /// The runnable moves into the returned dispatch; the record keeps only
    /// the bookkeeping needed for dependency lookups.
    fn promote(
        &mut self,
        id: LaunchId,
    ) -> Dispatch {
        let record = &mut self.launches[id.0];
        assert_eq!(
            record.status,
            LaunchStatus::Waiting,
            "{} promoted twice",
            id
        );
        let runnable = record
            .runnable
            .take()
            .expect("Waiting launch always holds its runnable");
        record.status = LaunchStatus::Ready;
        trace!("{} ready", id);

        Dispatch {
            launch: id,
            total: record.total,
            runnable,
        }
    }
}
