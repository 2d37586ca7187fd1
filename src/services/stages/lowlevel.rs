//! Low-level compile stage.
//!
//! Compiles the generated description together with every reference and
//! testbench file in the low-level region into a simulation image.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CommandConfig, Workspace};

use super::{invoke, Invocation, StageOutcome};

/// File the generated description is written to inside `iv/`.
pub const GENERATED_DESCRIPTION: &str = "top.v";

/// Stage that builds the simulation image.
pub struct LowLevelCompileStage {
    command: CommandConfig,
    timeout: Duration,
}

impl LowLevelCompileStage {
    pub fn new(command: CommandConfig, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Create a stage using `iverilog -g2012 -o a.out`.
    pub fn iverilog(timeout: Duration) -> Self {
        Self::new(CommandConfig::new("iverilog", &["-g2012", "-o", "a.out"]), timeout)
    }

    fn name(&self) -> &'static str {
        "lowlevel_compile"
    }

    /// Write `hdl` into the low-level region and compile every description
    /// file found there.
    pub async fn run(&self, workspace: &Workspace, hdl: &str) -> DomainResult<StageOutcome> {
        let region = workspace.lowlevel_dir();
        tokio::fs::create_dir_all(&region).await?;
        tokio::fs::write(region.join(GENERATED_DESCRIPTION), hdl).await?;

        let files = description_files(&region)?;
        tracing::info!(
            stage = self.name(),
            workspace_id = %workspace.id(),
            file_count = files.len(),
            "Running low-level compile"
        );

        let output = match invoke(&self.command, &files, &region, self.timeout).await? {
            Invocation::Finished(output) => output,
            Invocation::TimedOut(diagnostic) => {
                tracing::warn!(stage = self.name(), "Low-level compile timed out");
                return Ok(StageOutcome::Failed(diagnostic));
            }
        };

        tracing::info!(
            stage = self.name(),
            success = output.success(),
            "Low-level compile complete"
        );

        if output.success() {
            Ok(StageOutcome::Passed(String::new()))
        } else {
            Ok(StageOutcome::Failed(iv_error(&output.stdout, &output.stderr)))
        }
    }
}

/// Names of every `.v`/`.sv` file in `dir`, sorted.
pub fn description_files(dir: &Path) -> DomainResult<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path: PathBuf = entry?.path();
        let is_description = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("v" | "sv")
        );
        if path.is_file() && is_description {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Diagnostic text for a failed low-level compile.
pub fn iv_error(stdout: &str, stderr: &str) -> String {
    let mut message = String::from("Error: Cannot run Icarus Verilog.\n\n");
    if !stdout.is_empty() {
        message.push_str(&format!("Console STD Output: \n{stdout}\n"));
    }
    if !stderr.is_empty() {
        message.push_str(&format!("Console ERR Output: \n{stderr}\n"));
    }
    message
}
