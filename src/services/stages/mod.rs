//! Verification stages.
//!
//! Each stage wraps one external toolchain command and turns its exit status
//! and output into a [`StageOutcome`]. Stages are run in pipeline order by
//! [`StageRunner`]:
//!
//! | Stage              | Tool (default)            | Region          |
//! |--------------------|---------------------------|-----------------|
//! | Structural compile | `sbt run`                 | workspace root  |
//! | Low-level compile  | `iverilog -g2012 -o a.out`| `iv/`           |
//! | Execution          | `vvp a.out`               | `iv/`           |
//!
//! A stage that exceeds the toolchain timeout is killed and reported as a
//! failure of that stage with a `TimeoutError` diagnostic; it is never
//! retried.

pub mod execution;
pub mod lowlevel;
pub mod runner;
pub mod structural;

use std::path::Path;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::CommandConfig;
use crate::infrastructure::process::{run_command, CommandOutput, ProcessError};

pub use execution::ExecutionStage;
pub use lowlevel::LowLevelCompileStage;
pub use runner::StageRunner;
pub use structural::StructuralCompileStage;

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage passed; carries its product (generated HDL, simulation
    /// output) or an empty string when there is none.
    Passed(String),
    /// The stage failed; carries the diagnostic text.
    Failed(String),
}

/// A finished or timed-out tool invocation.
#[derive(Debug)]
pub(crate) enum Invocation {
    Finished(CommandOutput),
    TimedOut(String),
}

/// Run a stage command, folding a timeout into [`Invocation::TimedOut`].
///
/// Spawn failures are infrastructure faults and propagate as errors.
pub(crate) async fn invoke(
    command: &CommandConfig,
    extra_args: &[String],
    cwd: &Path,
    timeout: Duration,
) -> DomainResult<Invocation> {
    let mut args = command.args.clone();
    args.extend_from_slice(extra_args);

    match run_command(&command.program, &args, cwd, timeout).await {
        Ok(output) => Ok(Invocation::Finished(output)),
        Err(err @ ProcessError::Timeout { .. }) => Ok(Invocation::TimedOut(err.to_string())),
        Err(err) => Err(err.into()),
    }
}
