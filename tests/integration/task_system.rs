//! Public API behaviour shared by every task system.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tasksys::{
    LaunchId, Runnable, SchedulerError, SerialTaskSystem, TaskSystem, ThreadPoolTaskSystem,
};

fn systems() -> Vec<Box<dyn TaskSystem>> {
    vec![
        Box::new(SerialTaskSystem::new()),
        Box::new(ThreadPoolTaskSystem::new(1).unwrap()),
        Box::new(ThreadPoolTaskSystem::new(4).unwrap()),
    ]
}

/// Runnable writing `values[i] = f(values[i])` for a shared buffer.
struct MapBuffer {
    values: Arc<Vec<AtomicUsize>>,
    f: fn(usize) -> usize,
}

impl Runnable for MapBuffer {
    fn run_task(
        &self,
        index: usize,
        _total: usize,
    ) {
        let v = self.values[index].load(Ordering::SeqCst);
        self.values[index].store((self.f)(v), Ordering::SeqCst);
    }
}

#[test]
fn test_names() {
    let names: Vec<_> = systems().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["Serial", "Parallel + Thread Pool + Sleep", "Parallel + Thread Pool + Sleep"]
    );
}

#[test]
fn test_struct_runnable_pipeline() {
    for system in systems() {
        let values: Arc<Vec<AtomicUsize>> = Arc::new((0..100).map(AtomicUsize::new).collect());

        let double = system
            .run_async_with_deps(
                Arc::new(MapBuffer {
                    values: values.clone(),
                    f: |v| v * 2,
                }),
                100,
                &[],
            )
            .unwrap();
        system
            .run_async_with_deps(
                Arc::new(MapBuffer {
                    values: values.clone(),
                    f: |v| v + 1,
                }),
                100,
                &[double],
            )
            .unwrap();
        system.sync().unwrap();

        let got: Vec<usize> = values.iter().map(|v| v.load(Ordering::SeqCst)).collect();
        let want: Vec<usize> = (0..100).map(|v| v * 2 + 1).collect();
        assert_eq!(got, want, "{}", system.name());
    }
}

#[test]
fn test_fan_in_sees_all_producers() {
    for system in systems() {
        let produced = Arc::new(AtomicUsize::new(0));
        let observed = Arc::new(Mutex::new(None));

        let mut producers: Vec<LaunchId> = Vec::new();
        for _ in 0..8 {
            let p = produced.clone();
            producers.push(
                system
                    .run_async_with_deps(
                        Arc::new(move |_i: usize, _n: usize| {
                            p.fetch_add(1, Ordering::SeqCst);
                        }),
                        16,
                        &[],
                    )
                    .unwrap(),
            );
        }

        let (p, o) = (produced.clone(), observed.clone());
        system
            .run_async_with_deps(
                Arc::new(move |_i: usize, _n: usize| {
                    *o.lock() = Some(p.load(Ordering::SeqCst));
                }),
                1,
                &producers,
            )
            .unwrap();
        system.sync().unwrap();

        assert_eq!(*observed.lock(), Some(128), "{}", system.name());
    }
}

#[test]
fn test_ids_are_sequential() {
    for system in systems() {
        for expected in 0..5 {
            let id = system
                .run_async_with_deps(Arc::new(|_i: usize, _n: usize| {}), 2, &[])
                .unwrap();
            assert_eq!(id, LaunchId(expected));
        }
        system.sync().unwrap();
    }
}

#[test]
fn test_errors_are_uniform() {
    for system in systems() {
        let noop: Arc<dyn Runnable> = Arc::new(|_i: usize, _n: usize| {});

        assert_eq!(
            system.run_async_with_deps(noop.clone(), 1, &[LaunchId(3)]),
            Err(SchedulerError::DependencyNotFound(LaunchId(3)))
        );
        assert_eq!(
            system.run_async_with_deps(noop.clone(), 1, &[LaunchId(0)]),
            Err(SchedulerError::CyclicDependency(LaunchId(0)))
        );

        let result = system.run(Arc::new(|i: usize, _n: usize| assert_ne!(i, 1, "index one")), 3);
        match result {
            Err(SchedulerError::RunnableFailed { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
            }
            other => panic!("{}: unexpected result {:?}", system.name(), other),
        }
        system.sync().unwrap();
    }
}

#[test]
fn test_zero_threads_rejected() {
    assert!(matches!(
        ThreadPoolTaskSystem::new(0),
        Err(SchedulerError::InvalidArgument(_))
    ));
}
