//! tasksys - CLI

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use tasksys::util::config::AppConfig;
use tasksys::util::logger::{self, LogLevel};
use tasksys::{SerialTaskSystem, TaskSystem, ThreadPoolTaskSystem, Workload, NAME, VERSION};

/// Run built-in workloads on the available task systems
#[derive(Parser, Debug)]
#[command(name = "tasksys")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workload and report timings
    Run {
        /// Workload to run
        #[arg(value_enum, value_name = "WORKLOAD")]
        workload: Workload,

        /// Worker threads (overrides config and environment)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Task system(s) to run on
        #[arg(short, long, value_enum, default_value_t = SystemChoice::All)]
        system: SystemChoice,

        /// Timed repetitions per system; the best is reported
        #[arg(short, long, default_value_t = 3)]
        iterations: usize,

        /// Workload size multiplier
        #[arg(long, default_value_t = 1)]
        scale: usize,
    },

    /// List built-in workloads
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SystemChoice {
    /// Sleeping thread pool
    Sleeping,
    /// Serial reference
    Serial,
    /// Every system, results cross-checked
    All,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if args.verbose {
        config.log.level = LogLevel::Debug;
    }
    logger::init_with_level(config.log.level);
    debug!("{} {} on {}", NAME, VERSION, std::env::consts::OS);

    match args.command {
        Commands::Run {
            workload,
            threads,
            system,
            iterations,
            scale,
        } => {
            if let Some(threads) = threads {
                config.scheduler.num_workers = threads;
            }
            run_workload(&config, workload, system, iterations, scale)?;
        }
        Commands::List => {
            for workload in Workload::ALL {
                println!("{:<12} {}", workload.name(), workload.description());
            }
        }
    }

    Ok(())
}

fn run_workload(
    config: &AppConfig,
    workload: Workload,
    choice: SystemChoice,
    iterations: usize,
    scale: usize,
) -> Result<()> {
    if iterations == 0 {
        bail!("--iterations must be at least 1");
    }

    let mut systems: Vec<Box<dyn TaskSystem>> = Vec::new();
    if matches!(choice, SystemChoice::Serial | SystemChoice::All) {
        systems.push(Box::new(SerialTaskSystem::new()));
    }
    if matches!(choice, SystemChoice::Sleeping | SystemChoice::All) {
        let pool = ThreadPoolTaskSystem::with_config(config.scheduler.clone())
            .context("Failed to start thread pool")?;
        systems.push(Box::new(pool));
    }

    info!(
        "Running {} (scale {}, {} iteration(s))",
        workload, scale, iterations
    );
    println!("===================================================================================");
    println!("Test name: {}", workload);
    println!("-----------------------------------------------------------------------------------");

    let mut reference: Option<u64> = None;
    for system in &systems {
        let (best, checksum) = time_system(system.as_ref(), workload, iterations, scale)?;
        println!(
            "[{}]:\t\t[{:.3}] ms\tchecksum {:#018x}",
            system.name(),
            best.as_secs_f64() * 1000.0,
            checksum
        );

        match reference {
            None => reference = Some(checksum),
            Some(expected) if expected != checksum => {
                bail!(
                    "{} produced checksum {:#x}, expected {:#x}",
                    system.name(),
                    checksum,
                    expected
                );
            }
            Some(_) => {}
        }
    }
    println!("===================================================================================");

    Ok(())
}

/// Best time over `iterations` runs, plus the checksum all runs agreed on.
fn time_system(
    system: &dyn TaskSystem,
    workload: Workload,
    iterations: usize,
    scale: usize,
) -> Result<(Duration, u64)> {
    let mut best = Duration::MAX;
    let mut checksum = None;

    for iteration in 0..iterations {
        let start = Instant::now();
        let result = workload
            .run(system, scale)
            .with_context(|| format!("{} failed on {}", workload, system.name()))?;
        let elapsed = start.elapsed();
        debug!("{} iteration {}: {:?}", system.name(), iteration, elapsed);

        best = best.min(elapsed);
        if checksum.is_some_and(|c| c != result) {
            bail!("{} is not deterministic on {}", workload, system.name());
        }
        checksum = Some(result);
    }

    Ok((best, checksum.unwrap_or_default()))
}
