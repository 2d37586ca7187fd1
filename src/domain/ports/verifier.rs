//! Verifier port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CandidateArtifact, Problem, VerificationResult, Workspace};

/// Runs a candidate artifact through the verification pipeline.
///
/// Stage failures come back inside the [`VerificationResult`]; an `Err` is
/// reserved for infrastructure faults and violated invariants.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        artifact: &CandidateArtifact,
        problem: &Problem,
        workspace: &Workspace,
    ) -> DomainResult<VerificationResult>;
}
