//! Per-task result record persisted by campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::failure::RepairStrategy;
use super::verification::VerificationResult;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionOutcome {
    /// A candidate passed the functional check.
    Success,
    /// The iteration budget ran out.
    Exhausted,
    /// A provider response contained no extractable code.
    ParseError,
    /// An infrastructure fault ended the session (recorded under `skip`).
    Error,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Exhausted => "exhausted",
            Self::ParseError => "parse-error",
            Self::Error => "error",
        }
    }
}

/// Kind of repair try, serialized as the record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TryKind {
    Syntax,
    Functionality,
}

impl From<RepairStrategy> for TryKind {
    fn from(strategy: RepairStrategy) -> Self {
        match strategy {
            RepairStrategy::SyntaxRepair => Self::Syntax,
            RepairStrategy::FunctionalityRepair => Self::Functionality,
        }
    }
}

/// One repair try: the reviewer's reflection, the corrected response and the
/// verification of the corrected artifact.
///
/// The `tries` list of a [`TaskRecord`] is the persisted session trace: try
/// `i` carries the reflection and summary of attempt `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepairTry {
    #[serde(rename = "type")]
    pub kind: TryKind,
    pub reflection: String,
    /// Condensed attempt summary, when summaries are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub correction_result: String,
    /// Absent when the correction contained no code.
    pub verify_result: Option<VerificationResult>,
}

/// Structured document written per problem identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskRecord {
    pub prob_id: String,
    pub success: bool,
    pub outcome: SessionOutcome,
    pub initial_generation: Option<String>,
    pub initial_verify_result: Option<VerificationResult>,
    #[serde(default)]
    pub tries: Vec<RepairTry>,
    pub final_code: Option<String>,
    pub final_verify_result: Option<VerificationResult>,
    #[serde(default)]
    pub iterations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    /// Start an empty record for a problem.
    pub fn begin(prob_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            prob_id: prob_id.into(),
            success: false,
            outcome: SessionOutcome::Exhausted,
            initial_generation: None,
            initial_verify_result: None,
            tries: Vec::new(),
            final_code: None,
            final_verify_result: None,
            iterations: 0,
            started_at: now,
            finished_at: now,
            error: None,
        }
    }

    /// Record written when a session ended on a fault and the campaign
    /// continues past it.
    pub fn failed_with_error(prob_id: impl Into<String>, error: impl Into<String>) -> Self {
        let mut record = Self::begin(prob_id);
        record.outcome = SessionOutcome::Error;
        record.error = Some(error.into());
        record
    }

    pub fn finish(mut self, outcome: SessionOutcome) -> Self {
        self.success = outcome == SessionOutcome::Success;
        self.outcome = outcome;
        self.finished_at = Utc::now();
        self
    }

    /// Solved by the initial generation without any repair.
    pub fn first_try_success(&self) -> bool {
        self.success && self.tries.is_empty()
    }
}
