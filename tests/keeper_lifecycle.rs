//! End-to-end tests of the keeper control loop with a real child process.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use config_keeper::process::ProcessError;
use config_keeper::{Keeper, KeeperError, Shutdown};
use tokio::task::JoinHandle;

mod common;
use common::{is_alive, read_pids, wait_for_pids, Fixture};

fn spawn_keeper(
    settings: config_keeper::KeeperSettings,
) -> (Shutdown, JoinHandle<Result<(), KeeperError>>) {
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(Keeper::new(Arc::new(settings)).run(rx));
    (shutdown, handle)
}

async fn stop_keeper(shutdown: Shutdown, handle: JoinHandle<Result<(), KeeperError>>) {
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("keeper did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");
}

#[tokio::test]
async fn test_starts_child_on_valid_source() {
    let fx = Fixture::new();
    fx.write_source("host: logs.internal:9200\n");

    let (shutdown, handle) = spawn_keeper(fx.settings());
    let pids = wait_for_pids(&fx.pid_log(), 1).await;

    let rendered = fs::read_to_string(fx.destination()).unwrap();
    assert_eq!(rendered, "output:\n  hosts: [\"logs.internal:9200\"]\n");
    assert!(is_alive(pids[0]));

    stop_keeper(shutdown, handle).await;
    assert!(!is_alive(pids[0]));
}

#[tokio::test]
async fn test_missing_source_defers_start() {
    let fx = Fixture::new();
    let (shutdown, handle) = spawn_keeper(fx.settings());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(read_pids(&fx.pid_log()).is_empty());
    assert!(!fx.destination().exists());

    fx.write_source("host: late:9200\n");
    let pids = wait_for_pids(&fx.pid_log(), 1).await;
    assert_eq!(pids.len(), 1);

    stop_keeper(shutdown, handle).await;
}

#[tokio::test]
async fn test_edit_restarts_exactly_once() {
    let fx = Fixture::new();
    fx.write_source("host: a:9200\n");

    let (shutdown, handle) = spawn_keeper(fx.settings());
    let first = wait_for_pids(&fx.pid_log(), 1).await[0];

    fx.write_source("host: b:9200\n");
    let pids = wait_for_pids(&fx.pid_log(), 2).await;

    // Several poll periods with no further change.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(read_pids(&fx.pid_log()).len(), 2);

    assert!(!is_alive(first));
    assert!(is_alive(pids[1]));
    assert!(fs::read_to_string(fx.destination()).unwrap().contains("b:9200"));

    stop_keeper(shutdown, handle).await;
}

#[tokio::test]
async fn test_bad_edit_keeps_running_child() {
    let fx = Fixture::new();
    fx.write_source("host: good:9200\n");

    let (shutdown, handle) = spawn_keeper(fx.settings());
    let pid = wait_for_pids(&fx.pid_log(), 1).await[0];
    let before = fs::read_to_string(fx.destination()).unwrap();

    fx.write_source("host: [unclosed\n");
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(read_pids(&fx.pid_log()), vec![pid]);
    assert!(is_alive(pid));
    assert_eq!(fs::read_to_string(fx.destination()).unwrap(), before);

    stop_keeper(shutdown, handle).await;
}

#[tokio::test]
async fn test_template_error_blocks_start() {
    let fx = Fixture::new();
    fx.write_source("other: value\n");

    let (shutdown, handle) = spawn_keeper(fx.settings());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(read_pids(&fx.pid_log()).is_empty());

    fx.write_source("host: fixed:9200\n");
    wait_for_pids(&fx.pid_log(), 1).await;

    stop_keeper(shutdown, handle).await;
}

#[tokio::test]
async fn test_child_crash_is_fatal() {
    let fx = Fixture::new();
    fx.write_source("host: a:9200\n");
    let script = format!("echo $$ >> {}; exit 3", fx.pid_log().display());

    let (_shutdown, handle) = spawn_keeper(fx.settings_with_script(&script));

    let result = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("keeper kept running after the child died")
        .unwrap();

    match result {
        Err(KeeperError::Process(ProcessError::UnexpectedExit { exit, .. })) => {
            assert_eq!(exit.code(), Some(3));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(read_pids(&fx.pid_log()).len(), 1);
}

#[tokio::test]
async fn test_crash_before_reload_is_fatal() {
    let fx = Fixture::new();
    fx.write_source("host: a:9200\n");
    let script = format!("echo $$ >> {}; exit 3", fx.pid_log().display());
    let mut settings = fx.settings_with_script(&script);
    // Only the reload path can notice the crash.
    settings.health_check.interval = Duration::from_secs(3600);

    let (_shutdown, handle) = spawn_keeper(settings);
    wait_for_pids(&fx.pid_log(), 1).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    fx.write_source("host: b:9200\n");

    let result = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("keeper replaced a crashed child instead of failing")
        .unwrap();

    assert!(matches!(
        result,
        Err(KeeperError::Process(ProcessError::UnexpectedExit { .. }))
    ));
    assert_eq!(read_pids(&fx.pid_log()).len(), 1);
}

#[tokio::test]
async fn test_burst_during_slow_stop_restarts_once_with_last_content() {
    let fx = Fixture::new();
    fx.write_source("host: v0:9200\n");
    // Takes about a second to honor SIGTERM, holding the loop inside stop.
    let script = format!(
        "trap 'sleep 1; exit 0' TERM; echo $$ >> {}; while true; do sleep 0.1; done",
        fx.pid_log().display()
    );

    let (shutdown, handle) = spawn_keeper(fx.settings_with_script(&script));
    wait_for_pids(&fx.pid_log(), 1).await;

    fx.write_source("host: v1:9200\n");
    wait_for_rendered(&fx, "v1:9200").await;

    for i in 2..=6 {
        fx.write_source(&format!("host: v{i}:9200\n"));
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    // One launch for v1, then exactly one more for the whole burst.
    let pids = wait_for_pids(&fx.pid_log(), 3).await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(read_pids(&fx.pid_log()).len(), 3);
    assert!(is_alive(pids[2]));
    assert_eq!(
        fs::read_to_string(fx.destination()).unwrap(),
        "output:\n  hosts: [\"v6:9200\"]\n"
    );

    stop_keeper(shutdown, handle).await;
}

async fn wait_for_rendered(fx: &Fixture, needle: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !fs::read_to_string(fx.destination()).is_ok_and(|s| s.contains(needle)) {
        assert!(tokio::time::Instant::now() < deadline, "{needle} never rendered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_shutdown_before_any_child() {
    let fx = Fixture::new();
    let (shutdown, handle) = spawn_keeper(fx.settings());

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_keeper(shutdown, handle).await;
    assert!(read_pids(&fx.pid_log()).is_empty());
}
