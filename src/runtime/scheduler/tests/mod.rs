//! Scheduler 单元测试
//!
//! 测试启动记录、就绪队列、依赖跟踪和线程池调度行为

use std::sync::Arc;

use crate::runtime::scheduler::{LaunchId, LaunchStatus, Runnable, SchedulerError, SubtaskFailure};


/// Wrap a closure as a shareable runnable.
pub(super) fn runnable(f: impl Fn(usize, usize) + Send + Sync + 'static) -> Arc<dyn Runnable> {
    Arc::new(f)
}

/// Runnable that does nothing.
pub(super) fn noop() -> Arc<dyn Runnable> {
    runnable(|_, _| {})
}

#[cfg(test)]
mod launch_id_tests {
    use super::*;

    #[test]
    fn test_launch_id_ordering() {
        assert!(LaunchId(1) < LaunchId(2));
        assert_eq!(LaunchId::from(7), LaunchId(7));
        assert_eq!(usize::from(LaunchId(7)), 7);
    }

    #[test]
    fn test_launch_id_display() {
        assert_eq!(LaunchId(42).to_string(), "Launch(42)");
    }
}

#[cfg(test)]
mod launch_status_tests {
    use super::*;

    #[test]
    fn test_is_complete() {
        assert!(!LaunchStatus::Waiting.is_complete());
        assert!(!LaunchStatus::Ready.is_complete());
        assert!(LaunchStatus::Complete.is_complete());
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_runnable_failed_message_names_first_failure() {
        let err = SchedulerError::RunnableFailed {
            failures: vec![
                SubtaskFailure {
                    launch: LaunchId(3),
                    index: 1,
                    message: "boom".to_string(),
                },
                SubtaskFailure {
                    launch: LaunchId(4),
                    index: 0,
                    message: "bang".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("2 sub-task(s) failed"));
        assert!(text.contains("Launch(3)[1]: boom"));
    }

    #[test]
    fn test_dependency_errors_display() {
        assert_eq!(
            SchedulerError::DependencyNotFound(LaunchId(9)).to_string(),
            "Dependency not found: Launch(9)"
        );
        assert!(SchedulerError::CyclicDependency(LaunchId(2))
            .to_string()
            .contains("Launch(2)"));
    }

    #[test]
    fn test_closure_is_runnable() {
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = hits.clone();
        let r = runnable(move |i, n| {
            assert!(i < n);
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        r.run_task(0, 2);
        r.run_task(1, 2);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}

#[cfg(test)]
mod stats_tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::runtime::scheduler::SchedulerStats;

    #[test]
    fn test_peak_tracks_maximum() {
        let stats = SchedulerStats::default();
        stats.begin_subtask();
        stats.begin_subtask();
        stats.end_subtask(Duration::from_micros(10), false);
        stats.begin_subtask();
        stats.end_subtask(Duration::from_micros(20), true);
        stats.end_subtask(Duration::from_micros(30), false);

        assert_eq!(stats.active.load(Ordering::SeqCst), 0);
        assert_eq!(stats.peak_parallelism.load(Ordering::SeqCst), 2);
        assert_eq!(stats.subtasks_executed.load(Ordering::SeqCst), 3);
        assert_eq!(stats.subtasks_failed.load(Ordering::SeqCst), 1);
        assert_eq!(stats.mean_exec_time(), Duration::from_micros(20));
    }

    #[test]
    fn test_exec_time_saturates() {
        let stats = SchedulerStats::default();
        for _ in 0..2 {
            stats.begin_subtask();
            stats.end_subtask(Duration::MAX, false);
        }
        assert_eq!(stats.total_exec_time_us.load(Ordering::SeqCst), u64::MAX);
    }

    #[test]
    fn test_mean_without_samples() {
        assert_eq!(SchedulerStats::default().mean_exec_time(), Duration::ZERO);
    }
}
