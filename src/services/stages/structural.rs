//! Structural compile stage.
//!
//! Writes the decorated Chisel source into the workspace project, runs the
//! structural compiler (`sbt run` by default) and reads back the single
//! hardware description it emits into `generated/`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CommandConfig, Workspace};

use super::{invoke, Invocation, StageOutcome};
// ---------------------------------------------------------------------------
// StructuralCompileStage
// ---------------------------------------------------------------------------

/// Stage that translates the candidate source into a hardware description.
pub struct StructuralCompileStage {
    command: CommandConfig,
    timeout: Duration,
}

impl StructuralCompileStage {
    pub fn new(command: CommandConfig, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Create a stage using `sbt run`.
    pub fn sbt(timeout: Duration) -> Self {
        Self::new(CommandConfig::new("sbt", &["run"]), timeout)
    }

    fn name(&self) -> &'static str {
        "structural_compile"
    }

    /// Run the structural compiler over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] when the compiler cannot be
    /// spawned or does not emit exactly one description file.
    pub async fn run(&self, workspace: &Workspace, source: &str) -> DomainResult<StageOutcome> {
        tracing::info!(
            stage = self.name(),
            workspace_id = %workspace.id(),
            "Running structural compile"
        );

        let main_source = workspace.main_source();
        if let Some(parent) = main_source.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&main_source, source).await?;

        let generated = workspace.generated_dir();
        match tokio::fs::remove_dir_all(&generated).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let invocation =
            invoke(&self.command, &[], workspace.structural_dir(), self.timeout).await?;
        let output = match invocation {
            Invocation::Finished(output) => output,
            Invocation::TimedOut(diagnostic) => {
                tracing::warn!(stage = self.name(), "Structural compile timed out");
                return Ok(StageOutcome::Failed(diagnostic));
            }
        };

        if !output.success() {
            let mut diagnostic = filter_sbt_output(&output.stdout);
            if diagnostic.is_empty() {
                diagnostic = filter_sbt_output(&output.stderr);
            }
            tracing::info!(stage = self.name(), success = false, "Structural compile complete");
            return Ok(StageOutcome::Failed(diagnostic));
        }

        let description = single_description(&generated)?;
        let hdl = tokio::fs::read_to_string(&description).await?;

        tracing::info!(
            stage = self.name(),
            success = true,
            description = %description.display(),
            "Structural compile complete"
        );
        Ok(StageOutcome::Passed(hdl))
    }
}

/// Drop cosmetic sbt log noise: box-drawing continuation lines, empty lines
/// and `[info]`/`[warn]` lines.
pub fn filter_sbt_output(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.is_empty()
                && !line.starts_with("| =>")
                && !line.starts_with("[info]")
                && !line.starts_with("[warn]")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_description(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("v" | "sv")
    )
}

/// Locate the one `.v`/`.sv` file the compiler emitted.
fn single_description(dir: &Path) -> DomainResult<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        DomainError::Infrastructure(format!(
            "Structural compile reported success but {} is unreadable: {e}",
            dir.display()
        ))
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_description(&path) {
            found.push(path);
        }
    }

    match found.len() {
        1 => Ok(found.remove(0)),
        n => Err(DomainError::Infrastructure(format!(
            "Expected exactly one generated description in {}, found {n}",
            dir.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_sbt_noise() {
        let raw = "[info] welcome to sbt\n\
                   [warn] deprecated\n\
                   \n\
                   [error] Main.scala:4:3: not found: value foo\n\
                   [error]   | => core / Compile / compileIncremental 1s\n\
                   \x20 | => root / Compile / run\n\
                   [error] one error found";
        assert_eq!(
            filter_sbt_output(raw),
            "[error] Main.scala:4:3: not found: value foo\n\
             [error]   | => core / Compile / compileIncremental 1s\n\
             [error] one error found"
        );
    }

    #[test]
    fn indented_info_and_warn_lines_are_dropped() {
        let raw = "  [info] loading project definition\n\
                   \t[warn] Scala version was updated\n\
                   [error] Main.scala:2:1: expected class or object definition";
        assert_eq!(
            filter_sbt_output(raw),
            "[error] Main.scala:2:1: expected class or object definition"
        );
    }

    #[test]
    fn single_description_requires_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            single_description(dir.path()),
            Err(DomainError::Infrastructure(_))
        ));

        std::fs::write(dir.path().join("TopModule.v"), "module TopModule; endmodule").unwrap();
        std::fs::write(dir.path().join("TopModule.fir"), "circuit TopModule").unwrap();
        assert_eq!(
            single_description(dir.path()).unwrap(),
            dir.path().join("TopModule.v")
        );

        std::fs::write(dir.path().join("Other.sv"), "module Other; endmodule").unwrap();
        assert!(single_description(dir.path()).is_err());
    }

    #[test]
    fn missing_output_directory_is_infrastructure() {
        let dir = tempfile::tempdir().unwrap();
        let err = single_description(&dir.path().join("generated")).unwrap_err();
        assert!(matches!(err, DomainError::Infrastructure(_)));
    }
}
