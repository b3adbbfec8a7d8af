//! Process supervisor against real (trivial) child processes.

#![allow(clippy::expect_used)]

use std::time::Duration;

use tempfile::TempDir;
use vbmc_cli::application::ports::WorkerSupervisor;
use vbmc_cli::domain::{VbmcConfig, WorkerLaunch};
use vbmc_cli::infra::supervisor::{ProcessSupervisor, WorkerHandle};

use crate::helpers::entry;

fn config(stop_timeout_ms: u64) -> VbmcConfig {
    let mut config = VbmcConfig::default();
    config.server.worker_stop_timeout = stop_timeout_ms;
    config
}

fn sh(script: &str, config: &VbmcConfig) -> ProcessSupervisor {
    ProcessSupervisor::with_program("sh", vec!["-c".to_string(), script.to_string()], config)
}

async fn wait_for_exit(sup: &ProcessSupervisor, handle: &mut WorkerHandle) {
    for _ in 0..100 {
        if !sup.is_alive(handle) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("worker did not exit");
}

#[tokio::test]
async fn test_spawned_worker_is_alive_until_terminated() {
    let sup = ProcessSupervisor::with_program("sleep", vec!["30".to_string()], &config(2000));
    let mut handle = sup.spawn(&entry("vm1", true)).await.expect("spawn");

    assert!(sup.pid(&handle).is_some());
    assert!(sup.is_alive(&mut handle));
    assert_eq!(sup.exit_status(&mut handle), None);

    sup.terminate(&mut handle).await.expect("terminate");

    assert!(!sup.is_alive(&mut handle));
    assert_eq!(sup.exit_status(&mut handle), Some(-15));
}

#[tokio::test]
async fn test_exited_worker_reports_its_exit_code() {
    let sup = sh("exit 3", &config(2000));
    let mut handle = sup.spawn(&entry("vm1", true)).await.expect("spawn");

    wait_for_exit(&sup, &mut handle).await;

    assert_eq!(sup.exit_status(&mut handle), Some(3));
}

#[tokio::test]
async fn test_terminate_of_exited_worker_is_a_no_op() {
    let sup = sh("exit 0", &config(2000));
    let mut handle = sup.spawn(&entry("vm1", true)).await.expect("spawn");
    wait_for_exit(&sup, &mut handle).await;

    sup.terminate(&mut handle).await.expect("terminate");

    assert_eq!(sup.exit_status(&mut handle), Some(0));
}

#[tokio::test]
async fn test_worker_ignoring_sigterm_is_killed_after_grace_period() {
    let sup = sh("trap '' TERM; exec sleep 30", &config(200));
    let mut handle = sup.spawn(&entry("vm1", true)).await.expect("spawn");
    tokio::time::sleep(Duration::from_millis(300)).await;

    sup.terminate(&mut handle).await.expect("terminate");

    assert!(!sup.is_alive(&mut handle));
    assert!(sup.exit_status(&mut handle).is_some());
}

#[tokio::test]
async fn test_missing_program_fails_to_spawn() {
    let sup = ProcessSupervisor::with_program("/nonexistent/vbmc-worker", vec![], &config(2000));

    assert!(sup.spawn(&entry("vm1", true)).await.is_err());
}

#[tokio::test]
async fn test_launch_payload_arrives_on_stdin() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("payload.json");
    let sup = sh(&format!("cat > '{}'", out.display()), &config(2000));

    let mut handle = sup.spawn(&entry("vm1", true)).await.expect("spawn");
    wait_for_exit(&sup, &mut handle).await;

    let text = std::fs::read_to_string(&out).expect("payload written");
    let launch: WorkerLaunch = serde_json::from_str(&text).expect("payload parses");
    assert_eq!(launch.entry, entry("vm1", true));
    assert_eq!(launch.session_timeout, 1);
}
