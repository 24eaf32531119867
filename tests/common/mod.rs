//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated data dir plus a handle for running the `leadcall` binary in it.
pub struct Workspace {
    pub dir: TempDir,
}

/// Captured result of one CLI invocation.
pub struct Run {
    pub output: Output,
}

impl Run {
    pub fn success(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Parse stdout as a single JSON document.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.output.stdout).unwrap_or_else(|err| {
            panic!(
                "stdout is not JSON ({err}): {}\nstderr: {}",
                self.stdout(),
                self.stderr()
            )
        })
    }
}

impl Workspace {
    pub fn temp() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_leadcall"));
        cmd.arg("--data-dir")
            .arg(self.dir.path())
            .env_remove("LEADCALL_HOME")
            .env_remove("LEADCALL_PROVIDER_URL")
            .env_remove("LEADCALL_API_KEY")
            .env_remove("LEADCALL_ASSISTANT_ID")
            .env_remove("LEADCALL_PHONE_NUMBER_ID")
            .env("LEADCALL_LOG", "off");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Run {
        let output = self.command().args(args).output().expect("run leadcall");
        Run { output }
    }

    /// Run with `--json` and require success.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let run = self.run(&full);
        assert!(
            run.success(),
            "leadcall {args:?} failed\nstdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run.json()
    }

    pub fn login(&self) {
        self.run_json(&["login", "tester"]);
    }
}
