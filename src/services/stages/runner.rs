//! Stage runner.
//!
//! Runs the verification stages in pipeline order against one candidate
//! artifact and folds their outcomes into a [`VerificationResult`] through
//! the result builder, stopping at the first failing stage.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CandidateArtifact, FunctionalPredicate, Problem, ToolchainConfig, VerificationResult,
    Workspace,
};
use crate::domain::ports::Verifier;

use super::lowlevel::description_files;
use super::{ExecutionStage, LowLevelCompileStage, StageOutcome, StructuralCompileStage};

/// Simulation image name; removed before every verification.
const SIMULATION_IMAGE: &str = "a.out";

pub struct StageRunner {
    structural: StructuralCompileStage,
    lowlevel: LowLevelCompileStage,
    execution: ExecutionStage,
    predicate: FunctionalPredicate,
}

impl StageRunner {
    pub fn new(
        structural: StructuralCompileStage,
        lowlevel: LowLevelCompileStage,
        execution: ExecutionStage,
        predicate: FunctionalPredicate,
    ) -> Self {
        Self {
            structural,
            lowlevel,
            execution,
            predicate,
        }
    }

    /// Build a runner from the configured toolchain.
    pub fn from_config(toolchain: &ToolchainConfig, predicate: FunctionalPredicate) -> Self {
        let timeout = Duration::from_secs(toolchain.timeout_secs);
        Self::new(
            StructuralCompileStage::new(toolchain.structural.clone(), timeout),
            LowLevelCompileStage::new(toolchain.lowlevel.clone(), timeout),
            ExecutionStage::new(toolchain.execute.clone(), timeout),
            predicate,
        )
    }

    pub fn predicate(&self) -> FunctionalPredicate {
        self.predicate
    }

    /// Reset the low-level region to exactly the problem's fixtures.
    ///
    /// Description files and the simulation image left by an earlier attempt
    /// (or an earlier problem bound to the same workspace) are removed first.
    async fn prepare_fixtures(&self, problem: &Problem, workspace: &Workspace) -> DomainResult<()> {
        let region = workspace.lowlevel_dir();
        tokio::fs::create_dir_all(&region).await?;

        for stale in description_files(&region)? {
            tokio::fs::remove_file(region.join(stale)).await?;
        }
        match tokio::fs::remove_file(region.join(SIMULATION_IMAGE)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        for fixture in &problem.fixtures {
            tokio::fs::write(region.join(&fixture.file_name), &fixture.contents).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Verifier for StageRunner {
    #[instrument(
        skip_all,
        fields(problem_id = %problem.id, workspace_id = %workspace.id())
    )]
    async fn verify(
        &self,
        artifact: &CandidateArtifact,
        problem: &Problem,
        workspace: &Workspace,
    ) -> DomainResult<VerificationResult> {
        self.prepare_fixtures(problem, workspace).await?;
        let builder = VerificationResult::builder();

        let hdl = match self.structural.run(workspace, &artifact.decorated()).await? {
            StageOutcome::Passed(hdl) => hdl,
            StageOutcome::Failed(diagnostic) => {
                return builder.structural_failed(diagnostic).build();
            }
        };
        let builder = builder.structural_passed(hdl.clone());

        let builder = match self.lowlevel.run(workspace, &hdl).await? {
            StageOutcome::Passed(_) => builder.lowlevel_passed(),
            StageOutcome::Failed(diagnostic) => return builder.lowlevel_failed(diagnostic).build(),
        };

        let output = match self.execution.run(workspace).await? {
            StageOutcome::Passed(output) => output,
            StageOutcome::Failed(diagnostic) => return builder.execution_failed(diagnostic).build(),
        };

        let functionally_correct = self.predicate.evaluate(&output);
        tracing::info!(
            stage = "functional_check",
            predicate = self.predicate.as_str(),
            functionally_correct,
            "Functional check complete"
        );

        builder
            .execution_passed(output)
            .functional(functionally_correct)
            .build()
    }
}
