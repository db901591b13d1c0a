//! End-to-end checks of the `tasksys` binary.

use std::io::Write;
use std::process::{Command, Output};

fn tasksys(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasksys"))
        .args(args)
        .env_remove("TASKSYS_NUM_WORKERS")
        .env_remove("TASKSYS_LOG")
        .output()
        .expect("Failed to spawn tasksys")
}

#[test]
fn test_list_prints_every_workload() {
    let output = tasksys(&["list"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["super-light", "ping-pong", "math-loop", "diamond", "fibonacci"] {
        assert!(stdout.contains(name), "missing {name} in:\n{stdout}");
    }
}

#[test]
fn test_run_all_systems() {
    let output = tasksys(&["run", "diamond", "--threads", "3", "--iterations", "1"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("[Serial]"));
    assert!(stdout.contains("[Parallel + Thread Pool + Sleep]"));
}

#[test]
fn test_run_with_config_file() {
    let mut path = std::env::temp_dir();
    path.push(format!("tasksys-cli-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[scheduler]\nnum_workers = 2\n\n[log]\nlevel = \"error\"").unwrap();
    }

    let output = tasksys(&[
        "--config",
        path.to_str().unwrap(),
        "run",
        "ping-pong",
        "--system",
        "sleeping",
        "--iterations",
        "1",
    ]);
    std::fs::remove_file(&path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[Parallel + Thread Pool + Sleep]"));
    assert!(!stdout.contains("[Serial]"));
}

#[test]
fn test_invalid_arguments_fail() {
    assert!(!tasksys(&["run", "diamond", "--threads", "0"]).status.success());
    assert!(!tasksys(&["run", "diamond", "--iterations", "0"]).status.success());
    assert!(!tasksys(&["run", "no-such-workload"]).status.success());
    assert!(!tasksys(&["--config", "/nonexistent/tasksys.toml", "list"]).status.success());
}
