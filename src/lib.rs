//! tasksys - dependency-aware bulk task scheduling
//!
//! A task system executes *launches*: a launch runs one [`Runnable`] for
//! every index in `0..num_total_tasks`. Launches may depend on earlier
//! launches and only start once all of them have completed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use tasksys::{TaskSystem, ThreadPoolTaskSystem};
//!
//! let system = ThreadPoolTaskSystem::new(4).unwrap();
//! let sum = Arc::new(AtomicUsize::new(0));
//!
//! let s = sum.clone();
//! let first = system
//!     .run_async_with_deps(
//!         Arc::new(move |i: usize, _n: usize| {
//!             s.fetch_add(i, Ordering::SeqCst);
//!         }),
//!         10,
//!         &[],
//!     )
//!     .unwrap();
//!
//! let s = sum.clone();
//! system
//!     .run_async_with_deps(
//!         Arc::new(move |_i: usize, _n: usize| {
//!             assert_eq!(s.load(Ordering::SeqCst), 45);
//!         }),
//!         1,
//!         &[first],
//!     )
//!     .unwrap();
//!
//! system.sync().unwrap();
//! ```

#![warn(rust_2018_idioms)]

pub mod runtime;
pub mod util;
pub mod workloads;

// Re-exports
pub use runtime::scheduler::{
    LaunchId, LaunchStatus, Runnable, SchedulerConfig, SchedulerError, SchedulerResult,
    SerialTaskSystem, TaskSystem, ThreadPoolTaskSystem,
};
pub use workloads::Workload;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "tasksys";
