//! Verification result domain model.
//!
//! A [`VerificationResult`] is the immutable outcome of running one
//! candidate artifact through the stage pipeline. Results are only produced
//! by [`VerificationResultBuilder::build`], which refuses to yield a value
//! that is partially populated or that records a later stage after an
//! earlier one failed.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// One ordered phase of verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StructuralCompile,
    LowLevelCompile,
    Execution,
    FunctionalCheck,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralCompile => "structural_compile",
            Self::LowLevelCompile => "lowlevel_compile",
            Self::Execution => "execution",
            Self::FunctionalCheck => "functional_check",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outcome of a single verification attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub structural_compile_ok: bool,
    pub structural_compile_error: String,
    /// Hardware description emitted by the structural compiler.
    pub generated_hdl: String,
    pub lowlevel_compile_ok: bool,
    pub lowlevel_compile_error: String,
    pub execution_ok: bool,
    pub execution_output: String,
    pub functionally_correct: bool,
}

impl VerificationResult {
    pub fn builder() -> VerificationResultBuilder {
        VerificationResultBuilder::default()
    }

    /// Both compile stages passed.
    pub fn syntax_ok(&self) -> bool {
        self.structural_compile_ok && self.lowlevel_compile_ok
    }

    /// The sole terminal success condition.
    pub fn is_success(&self) -> bool {
        self.functionally_correct
    }

    /// Check the ordering invariant: a later stage only carries a non-default
    /// value when every earlier stage passed.
    pub fn validate(&self) -> DomainResult<()> {
        let ordered = [
            (self.structural_compile_ok, Stage::StructuralCompile),
            (self.lowlevel_compile_ok, Stage::LowLevelCompile),
            (self.execution_ok, Stage::Execution),
            (self.functionally_correct, Stage::FunctionalCheck),
        ];

        let mut earlier_failed: Option<Stage> = None;
        for (ok, stage) in ordered {
            if let Some(failed) = earlier_failed {
                if ok {
                    return Err(DomainError::InvariantViolation(format!(
                        "{stage} passed although {failed} failed"
                    )));
                }
            } else if !ok {
                earlier_failed = Some(stage);
            }
        }

        if !self.structural_compile_ok && !self.generated_hdl.is_empty() {
            return Err(DomainError::InvariantViolation(
                "generated HDL recorded for a failed structural compile".to_string(),
            ));
        }
        if !self.structural_compile_ok && !self.lowlevel_compile_error.is_empty() {
            return Err(DomainError::InvariantViolation(
                "low-level diagnostic recorded without a structural compile".to_string(),
            ));
        }
        if !self.lowlevel_compile_ok && !self.execution_output.is_empty() {
            return Err(DomainError::InvariantViolation(
                "execution output recorded without a low-level compile".to_string(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Recorded<T> {
    Pending,
    Passed(T),
    Failed(String),
}

/// Accumulates stage outcomes in pipeline order.
///
/// Each stage is recorded at most once. [`build`](Self::build) validates that
/// the pipeline either ran to the functional check or stopped at the first
/// failing stage, with nothing recorded after it.
#[derive(Debug, Clone)]
pub struct VerificationResultBuilder {
    structural: Recorded<String>,
    lowlevel: Recorded<()>,
    execution: Recorded<String>,
    functional: Option<bool>,
    violation: Option<String>,
}

impl Default for VerificationResultBuilder {
    fn default() -> Self {
        Self {
            structural: Recorded::Pending,
            lowlevel: Recorded::Pending,
            execution: Recorded::Pending,
            functional: None,
            violation: None,
        }
    }
}

impl VerificationResultBuilder {
    /// The next stage the pipeline is expected to run, or `None` once the
    /// pipeline is complete or has stopped on a failure.
    pub fn next_stage(&self) -> Option<Stage> {
        match (&self.structural, &self.lowlevel, &self.execution, self.functional) {
            (Recorded::Pending, ..) => Some(Stage::StructuralCompile),
            (Recorded::Failed(_), ..) => None,
            (Recorded::Passed(_), Recorded::Pending, ..) => Some(Stage::LowLevelCompile),
            (Recorded::Passed(_), Recorded::Failed(_), ..) => None,
            (Recorded::Passed(_), Recorded::Passed(()), Recorded::Pending, _) => {
                Some(Stage::Execution)
            }
            (Recorded::Passed(_), Recorded::Passed(()), Recorded::Failed(_), _) => None,
            (_, _, Recorded::Passed(_), None) => Some(Stage::FunctionalCheck),
            (_, _, Recorded::Passed(_), Some(_)) => None,
        }
    }

    fn expect_stage(&mut self, stage: Stage) -> bool {
        if self.violation.is_some() {
            return false;
        }
        if self.next_stage() == Some(stage) {
            true
        } else {
            self.violation = Some(format!(
                "{stage} recorded out of order (expected {})",
                self.next_stage()
                    .map_or_else(|| "no further stage".to_string(), |s| s.to_string())
            ));
            false
        }
    }

    pub fn structural_passed(mut self, generated_hdl: impl Into<String>) -> Self {
        if self.expect_stage(Stage::StructuralCompile) {
            self.structural = Recorded::Passed(generated_hdl.into());
        }
        self
    }

    pub fn structural_failed(mut self, diagnostic: impl Into<String>) -> Self {
        if self.expect_stage(Stage::StructuralCompile) {
            self.structural = Recorded::Failed(diagnostic.into());
        }
        self
    }

    pub fn lowlevel_passed(mut self) -> Self {
        if self.expect_stage(Stage::LowLevelCompile) {
            self.lowlevel = Recorded::Passed(());
        }
        self
    }

    pub fn lowlevel_failed(mut self, diagnostic: impl Into<String>) -> Self {
        if self.expect_stage(Stage::LowLevelCompile) {
            self.lowlevel = Recorded::Failed(diagnostic.into());
        }
        self
    }

    pub fn execution_passed(mut self, output: impl Into<String>) -> Self {
        if self.expect_stage(Stage::Execution) {
            self.execution = Recorded::Passed(output.into());
        }
        self
    }

    /// Execution did not produce a usable output (for example a timeout).
    pub fn execution_failed(mut self, output: impl Into<String>) -> Self {
        if self.expect_stage(Stage::Execution) {
            self.execution = Recorded::Failed(output.into());
        }
        self
    }

    pub fn functional(mut self, correct: bool) -> Self {
        if self.expect_stage(Stage::FunctionalCheck) {
            self.functional = Some(correct);
        }
        self
    }

    /// Finalize the result.
    ///
    /// Fails with [`DomainError::InvariantViolation`] when a stage was
    /// recorded out of order or an exercised stage was never concluded.
    pub fn build(self) -> DomainResult<VerificationResult> {
        if let Some(violation) = self.violation {
            return Err(DomainError::InvariantViolation(violation));
        }
        if let Some(stage) = self.next_stage() {
            return Err(DomainError::InvariantViolation(format!(
                "verification incomplete: {stage} was never recorded"
            )));
        }

        let mut result = VerificationResult::default();

        match self.structural {
            Recorded::Passed(hdl) => {
                result.structural_compile_ok = true;
                result.generated_hdl = hdl;
            }
            Recorded::Failed(diag) => result.structural_compile_error = diag,
            Recorded::Pending => {}
        }
        match self.lowlevel {
            Recorded::Passed(()) => result.lowlevel_compile_ok = true,
            Recorded::Failed(diag) => result.lowlevel_compile_error = diag,
            Recorded::Pending => {}
        }
        match self.execution {
            Recorded::Passed(output) => {
                result.execution_ok = true;
                result.execution_output = output;
            }
            Recorded::Failed(output) => result.execution_output = output,
            Recorded::Pending => {}
        }
        result.functionally_correct = self.functional.unwrap_or(false);

        result.validate()?;
        Ok(result)
    }
}
