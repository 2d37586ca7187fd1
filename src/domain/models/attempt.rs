//! Attempt domain model.

use serde::{Deserialize, Serialize};

use super::artifact::CandidateArtifact;
use super::verification::VerificationResult;

/// One completed, non-terminal iteration of a repair session.
///
/// Attempts are appended to history in generation order and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub artifact: CandidateArtifact,
    pub verification: VerificationResult,
    /// Natural-language critique produced by the reviewer for this attempt.
    pub reviewer_response: String,
    /// Condensed summary, when summaries are enabled.
    pub llm_summary: Option<String>,
}

impl Attempt {
    pub fn new(
        artifact: CandidateArtifact,
        verification: VerificationResult,
        reviewer_response: impl Into<String>,
        llm_summary: Option<String>,
    ) -> Self {
        Self {
            artifact,
            verification,
            reviewer_response: reviewer_response.into(),
            llm_summary,
        }
    }

    /// The summary shown to the model in later prompts: the condensed
    /// summary if one was produced, otherwise the reviewer response.
    pub fn summary(&self) -> &str {
        self.llm_summary
            .as_deref()
            .unwrap_or(&self.reviewer_response)
    }
}
