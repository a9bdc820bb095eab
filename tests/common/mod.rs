//! Shared integration-test harness for running the `cvpipeline` binary as a
//! child process.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Helpers for one-shot invocations of the binary.
pub struct CvPipelineProcess;

impl CvPipelineProcess {
    fn command(args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_cvpipeline"));
        command
            .args(args)
            .env_remove("CVPIPELINE_CONFIG")
            .env_remove("CVPIPELINE_RESUME")
            .env_remove("CVPIPELINE_SPEED")
            .env_remove("CVPIPELINE_EVENTS_FILE")
            .env("CVPIPELINE_COLOR", "never")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Runs a command to completion with stdin closed.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Self::command(args)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run cvpipeline")
    }

    /// Runs a command to completion, feeding `input` on stdin then closing it.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_with_input(args: &[&str], input: &str) -> Output {
        let mut child = Self::command(args)
            .stdin(Stdio::piped())
            .spawn()
            .expect("failed to spawn cvpipeline");
        {
            let mut stdin = child.stdin.take().expect("stdin not captured");
            stdin
                .write_all(input.as_bytes())
                .expect("failed to write stdin");
        }
        child.wait_with_output().expect("failed to wait for cvpipeline")
    }

    /// Returns the path to a fixture under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Reads a JSONL file into values.
    #[allow(clippy::missing_panics_doc)]
    pub fn read_events(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .expect("events file should exist")
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("event line should be JSON"))
            .collect()
    }
}

/// Stdout as a lossy string.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as a lossy string.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
