//! 内置工作负载测试

use crate::runtime::scheduler::{SerialTaskSystem, TaskSystem, ThreadPoolTaskSystem};
use crate::workloads::Workload;

#[test]
fn test_workload_names_are_unique() {
    let mut names: Vec<_> = Workload::ALL.iter().map(|w| w.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), Workload::ALL.len());
}

#[test]
fn test_super_light_checksum() {
    // 32 cells, each receives 0 + 1 + ... + 255
    let serial = SerialTaskSystem::new();
    assert_eq!(Workload::SuperLight.run(&serial, 1).unwrap(), 32 * 32640);
}

#[test]
fn test_fibonacci_checksum() {
    // 8 sub-tasks each of fib(19), fib(20), fib(21), fib(22)
    let pool = ThreadPoolTaskSystem::new(4).unwrap();
    assert_eq!(
        Workload::Fibonacci.run(&pool, 1).unwrap(),
        8 * (4181 + 6765 + 10946 + 17711)
    );
}

#[test]
fn test_thread_pool_matches_serial() {
    let serial = SerialTaskSystem::new();
    let pool = ThreadPoolTaskSystem::new(4).unwrap();

    for workload in Workload::ALL {
        let expected = workload.run(&serial, 1).unwrap();
        let actual = workload.run(&pool, 1).unwrap();
        assert_eq!(actual, expected, "{} diverged on {}", workload, pool.name());
    }
}

#[test]
fn test_single_worker_matches_serial() {
    let serial = SerialTaskSystem::new();
    let pool = ThreadPoolTaskSystem::new(1).unwrap();

    for workload in [Workload::PingPong, Workload::Diamond] {
        assert_eq!(
            workload.run(&pool, 1).unwrap(),
            workload.run(&serial, 1).unwrap()
        );
    }
}
