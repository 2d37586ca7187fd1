//! External process execution.
//!
//! Every toolchain invocation goes through [`run_command`]: the child runs in
//! a given directory, is killed if it outlives the timeout, and has ANSI
//! control sequences removed from both output streams.

use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use thiserror::Error;
use tokio::process::Command;

use crate::domain::errors::DomainError;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("valid ANSI regex"));

/// Errors from launching or supervising a child process
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TimeoutError: `{command}` did not finish within {secs}s")]
    Timeout { command: String, secs: u64 },
}

impl From<ProcessError> for DomainError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Spawn { .. } => DomainError::Infrastructure(err.to_string()),
            ProcessError::Timeout { command, secs } => DomainError::Timeout { command, secs },
        }
    }
}

/// Captured result of a finished child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Run `program args..` in `cwd`, killing it after `timeout`.
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let command_line = if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    };

    tracing::debug!(command = %command_line, cwd = %cwd.display(), "Running external command");

    let started = Instant::now();
    let child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(result) => result.map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            tracing::warn!(
                command = %command_line,
                timeout_secs = timeout.as_secs(),
                "External command timed out"
            );
            return Err(ProcessError::Timeout {
                command: command_line,
                secs: timeout.as_secs(),
            });
        }
    };

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let result = CommandOutput {
        code: output.status.code(),
        stdout: strip_ansi(&String::from_utf8_lossy(&output.stdout)),
        stderr: strip_ansi(&String::from_utf8_lossy(&output.stderr)),
        duration_ms,
    };

    tracing::debug!(
        command = %command_line,
        code = ?result.code,
        duration_ms,
        "External command finished"
    );

    Ok(result)
}
