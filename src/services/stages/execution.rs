//! Execution stage.

use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CommandConfig, Workspace};

use super::{invoke, Invocation, StageOutcome};

/// Stage that runs the compiled simulation image and captures its output.
///
/// A successfully built image is expected to run: a non-zero exit is an
/// infrastructure fault, not a property of the candidate.
pub struct ExecutionStage {
    command: CommandConfig,
    timeout: Duration,
}

impl ExecutionStage {
    pub fn new(command: CommandConfig, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Create a stage using `vvp a.out`.
    pub fn vvp(timeout: Duration) -> Self {
        Self::new(CommandConfig::new("vvp", &["a.out"]), timeout)
    }

    fn name(&self) -> &'static str {
        "execution"
    }

    pub async fn run(&self, workspace: &Workspace) -> DomainResult<StageOutcome> {
        tracing::info!(
            stage = self.name(),
            workspace_id = %workspace.id(),
            "Running simulation"
        );

        let region = workspace.lowlevel_dir();
        let output = match invoke(&self.command, &[], &region, self.timeout).await? {
            Invocation::Finished(output) => output,
            Invocation::TimedOut(diagnostic) => {
                tracing::warn!(stage = self.name(), "Simulation timed out");
                return Ok(StageOutcome::Failed(diagnostic));
            }
        };

        if !output.success() {
            tracing::error!(
                stage = self.name(),
                code = ?output.code,
                "Simulation exited abnormally after a successful compile"
            );
            return Err(DomainError::Infrastructure(format!(
                "`{}` exited with {:?} after a successful low-level compile: {}",
                self.command.program,
                output.code,
                output.stderr.trim()
            )));
        }

        tracing::info!(
            stage = self.name(),
            duration_ms = output.duration_ms,
            "Simulation complete"
        );
        Ok(StageOutcome::Passed(output.stdout))
    }
}
