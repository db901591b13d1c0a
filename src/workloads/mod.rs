//! Built-in workloads
//!
//! Small synthetic programs that exercise a [`TaskSystem`] the way real
//! callers do: long dependency chains of tiny launches, ping-pong buffers,
//! fan-out/fan-in graphs and compute-heavy sub-tasks. Every workload returns
//! a checksum that is identical for every correct task system, which makes
//! them usable both as benchmarks and as cross-checks between strategies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clap::ValueEnum;

use crate::runtime::scheduler::{LaunchId, SchedulerResult, TaskSystem};

/// Available workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    /// Long chain of launches with trivial sub-tasks.
    SuperLight,
    /// Two buffers rewritten alternately by dependent launches.
    PingPong,
    /// Independent math-heavy launches joined by one reduction.
    MathLoop,
    /// Repeated A -> (B, C) -> D dependency diamonds.
    Diamond,
    /// Recursive Fibonacci per sub-task.
    Fibonacci,
}

impl Workload {
    /// Every workload, in listing order.
    pub const ALL: [Workload; 5] = [
        Workload::SuperLight,
        Workload::PingPong,
        Workload::MathLoop,
        Workload::Diamond,
        Workload::Fibonacci,
    ];

    /// Short name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Workload::SuperLight => "super-light",
            Workload::PingPong => "ping-pong",
            Workload::MathLoop => "math-loop",
            Workload::Diamond => "diamond",
            Workload::Fibonacci => "fibonacci",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Workload::SuperLight => "chain of launches with trivial sub-tasks",
            Workload::PingPong => "dependent launches bouncing between two buffers",
            Workload::MathLoop => "independent math-heavy launches joined by a reduction",
            Workload::Diamond => "repeated A -> (B, C) -> D dependency diamonds",
            Workload::Fibonacci => "recursive Fibonacci in every sub-task",
        }
    }

    /// Run the workload to completion and return its checksum.
    ///
    /// `scale` grows the amount of work roughly linearly; 1 is a quick run.
    pub fn run(
        &self,
        system: &dyn TaskSystem,
        scale: usize,
    ) -> SchedulerResult<u64> {
        let scale = scale.max(1);
        match self {
            Workload::SuperLight => super_light(system, 256 * scale, 32),
            Workload::PingPong => ping_pong(system, 64 * scale, 512),
            Workload::MathLoop => math_loop(system, 16, 64, 2_000 * scale),
            Workload::Diamond => diamond(system, 16 * scale, 256),
            Workload::Fibonacci => fibonacci(system, 32, 18 + scale.min(8) as u64),
        }
    }
}

impl std::fmt::Display for Workload {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn cells(len: usize) -> Arc<Vec<AtomicU64>> {
    Arc::new((0..len).map(|_| AtomicU64::new(0)).collect())
}

fn checksum(values: &[AtomicU64]) -> u64 {
    values
        .iter()
        .fold(0u64, |acc, v| acc.wrapping_add(v.load(Ordering::Relaxed)))
}

/// `launches` chained launches, each adding its ordinal to every cell.
fn super_light(
    system: &dyn TaskSystem,
    launches: usize,
    width: usize,
) -> SchedulerResult<u64> {
    let out = cells(width);
    let mut prev: Option<LaunchId> = None;

    for ordinal in 0..launches {
        let out = out.clone();
        let deps: Vec<LaunchId> = prev.into_iter().collect();
        let id = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                out[i].fetch_add(ordinal as u64, Ordering::Relaxed);
            }),
            width,
            &deps,
        )?;
        prev = Some(id);
    }
    system.sync()?;

    Ok(checksum(&out))
}

/// Each launch maps one buffer into the other, depending on the previous.
fn ping_pong(
    system: &dyn TaskSystem,
    rounds: usize,
    len: usize,
) -> SchedulerResult<u64> {
    let buffers = [cells(len), cells(len)];
    for (i, cell) in buffers[0].iter().enumerate() {
        cell.store(i as u64, Ordering::Relaxed);
    }

    let mut prev: Option<LaunchId> = None;
    for round in 0..rounds {
        let src = buffers[round % 2].clone();
        let dst = buffers[(round + 1) % 2].clone();
        let deps: Vec<LaunchId> = prev.into_iter().collect();
        let id = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                let v = src[i].load(Ordering::Relaxed);
                dst[i].store(v.wrapping_mul(6364136223846793005).wrapping_add(1), Ordering::Relaxed);
            }),
            len,
            &deps,
        )?;
        prev = Some(id);
    }
    system.sync()?;

    Ok(checksum(&buffers[rounds % 2]))
}

/// `launches` independent launches of float math plus one reduction launch.
fn math_loop(
    system: &dyn TaskSystem,
    launches: usize,
    width: usize,
    iterations: usize,
) -> SchedulerResult<u64> {
    let results = cells(launches * width);
    let total = cells(1);

    let mut producers = Vec::with_capacity(launches);
    for l in 0..launches {
        let results = results.clone();
        let id = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                let mut x = 1.0f64 + (l * width + i) as f64 * 1e-3;
                for _ in 0..iterations {
                    x = (x * 1.000_001 + 0.5).sqrt() + 0.25;
                }
                results[l * width + i].store(x.to_bits(), Ordering::Relaxed);
            }),
            width,
            &[],
        )?;
        producers.push(id);
    }

    let reduce_results = results.clone();
    let reduce_total = total.clone();
    system.run_async_with_deps(
        Arc::new(move |_i: usize, _n: usize| {
            reduce_total[0].store(checksum(&reduce_results), Ordering::Relaxed);
        }),
        1,
        &producers,
    )?;
    system.sync()?;

    Ok(total[0].load(Ordering::Relaxed))
}

/// Rounds of A -> (B, C) -> D, each round depending on the previous D.
fn diamond(
    system: &dyn TaskSystem,
    rounds: usize,
    len: usize,
) -> SchedulerResult<u64> {
    let a = cells(len);
    let b = cells(len);
    let c = cells(len);
    let d = cells(len);

    let mut prev: Option<LaunchId> = None;
    for round in 0..rounds {
        let deps: Vec<LaunchId> = prev.into_iter().collect();

        let (a_out, d_in) = (a.clone(), d.clone());
        let top = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                let seed = d_in[i].load(Ordering::Relaxed);
                a_out[i].store(seed.wrapping_add((round * len + i) as u64), Ordering::Relaxed);
            }),
            len,
            &deps,
        )?;

        let (a_in, b_out) = (a.clone(), b.clone());
        let left = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                b_out[i].store(a_in[i].load(Ordering::Relaxed).wrapping_mul(3), Ordering::Relaxed);
            }),
            len,
            &[top],
        )?;

        let (a_in, c_out) = (a.clone(), c.clone());
        let right = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                c_out[i].store(a_in[i].load(Ordering::Relaxed) ^ 0x5555, Ordering::Relaxed);
            }),
            len,
            &[top],
        )?;

        let (b_in, c_in, d_out) = (b.clone(), c.clone(), d.clone());
        let bottom = system.run_async_with_deps(
            Arc::new(move |i: usize, _n: usize| {
                let v = b_in[i]
                    .load(Ordering::Relaxed)
                    .wrapping_add(c_in[i].load(Ordering::Relaxed));
                d_out[i].store(v, Ordering::Relaxed);
            }),
            len,
            &[left, right],
        )?;
        prev = Some(bottom);
    }
    system.sync()?;

    Ok(checksum(&d))
}

/// One launch computing `fib(depth + i % 4)` per sub-task.
fn fibonacci(
    system: &dyn TaskSystem,
    width: usize,
    depth: u64,
) -> SchedulerResult<u64> {
    fn fib(n: u64) -> u64 {
        if n < 2 {
            n
        } else {
            fib(n - 1) + fib(n - 2)
        }
    }

    let out = cells(width);
    let sink = out.clone();
    system.run(
        Arc::new(move |i: usize, _n: usize| {
            sink[i].store(fib(depth + (i % 4) as u64), Ordering::Relaxed);
        }),
        width,
    )?;

    Ok(checksum(&out))
}

#[cfg(test)]
mod tests;
