//! Shared fixtures for keeper integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use config_keeper::KeeperSettings;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tempfile::TempDir;

pub const TEMPLATE: &str = "output:\n  hosts: [\"{{ host }}\"]\n";

/// Scratch directory holding the source, template, destination and pid log.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("template.tpl"), TEMPLATE).unwrap();
        Self { dir }
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("source.yml")
    }

    pub fn destination(&self) -> PathBuf {
        self.dir.path().join("out").join("rendered.yml")
    }

    pub fn pid_log(&self) -> PathBuf {
        self.dir.path().join("pids")
    }

    pub fn write_source(&self, contents: &str) {
        fs::write(self.source(), contents).unwrap();
    }

    /// Settings with short intervals and a child that logs its pid then sleeps.
    pub fn settings(&self) -> KeeperSettings {
        let script = format!("echo $$ >> {}; exec sleep 30", self.pid_log().display());
        self.settings_with_script(&script)
    }

    pub fn settings_with_script(&self, script: &str) -> KeeperSettings {
        let mut settings = KeeperSettings::default();
        settings.process.executable = "sh".to_string();
        settings.process.args = vec!["-c".to_string(), script.to_string()];
        settings.process.stop_timeout = Duration::from_secs(2);
        settings.source.path = self.source();
        settings.source.template_path = self.dir.path().join("template.tpl");
        settings.source.destination_path = self.destination();
        settings.source.poll_interval = Duration::from_millis(50);
        settings.health_check.interval = Duration::from_millis(100);
        settings.observability.echo_rendered = false;
        settings
    }
}

/// Pids recorded by every child launched so far, oldest first.
pub fn read_pids(path: &Path) -> Vec<i32> {
    fs::read_to_string(path)
        .map(|s| s.lines().filter_map(|l| l.trim().parse().ok()).collect())
        .unwrap_or_default()
}

/// Poll the pid log until it holds at least `count` entries.
pub async fn wait_for_pids(path: &Path, count: usize) -> Vec<i32> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let pids = read_pids(path);
        if pids.len() >= count {
            return pids;
        }
        if Instant::now() > deadline {
            panic!("expected {count} launches, saw {}", pids.len());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub fn is_alive(pid: i32) -> bool {
    kill(Pid::from_raw(pid), None).is_ok()
}
