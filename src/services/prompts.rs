//! Prompt templates and feedback rendering.
//!
//! Templates are plain-text files loaded once at startup from the configured
//! prompt directory. A missing template is a configuration error.

use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FailureClass, PromptsConfig, RepairStrategy, VerificationResult};

/// The loaded system prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub init_gen: String,
    pub sbt_reflection: String,
    pub iv_reflection: String,
    pub syntax_correction: String,
    pub functionality_reflection: String,
    pub functionality_correction: String,
    /// Only loaded when attempt summaries are enabled.
    pub attempt_summary: Option<String>,
}

impl PromptSet {
    /// Load every template named in `config`.
    ///
    /// The attempt-summary template is only required when `with_summary` is
    /// set.
    pub fn load(config: &PromptsConfig, with_summary: bool) -> DomainResult<Self> {
        let dir = config.dir.as_path();
        let prompts = Self {
            init_gen: read_template(dir, &config.init_gen)?,
            sbt_reflection: read_template(dir, &config.sbt_reflection)?,
            iv_reflection: read_template(dir, &config.iv_reflection)?,
            syntax_correction: read_template(dir, &config.syntax_correction)?,
            functionality_reflection: read_template(dir, &config.functionality_reflection)?,
            functionality_correction: read_template(dir, &config.functionality_correction)?,
            attempt_summary: if with_summary {
                Some(read_template(dir, &config.attempt_summary)?)
            } else {
                None
            },
        };

        tracing::debug!(dir = %dir.display(), with_summary, "Prompt templates loaded");
        Ok(prompts)
    }

    /// Reviewer system prompt for a failure class.
    pub fn reflection_for(&self, class: FailureClass) -> DomainResult<&str> {
        match class {
            FailureClass::StructuralCompile => Ok(&self.sbt_reflection),
            FailureClass::LowLevelCompile => Ok(&self.iv_reflection),
            FailureClass::Functional => Ok(&self.functionality_reflection),
            FailureClass::None => Err(DomainError::InvariantViolation(
                "no reflection prompt for a passing result".to_string(),
            )),
        }
    }

    /// Generator system prompt for a repair strategy.
    pub fn correction_for(&self, strategy: RepairStrategy) -> &str {
        match strategy {
            RepairStrategy::SyntaxRepair => &self.syntax_correction,
            RepairStrategy::FunctionalityRepair => &self.functionality_correction,
        }
    }
}

fn read_template(dir: &Path, file_name: &str) -> DomainResult<String> {
    let path = dir.join(file_name);
    std::fs::read_to_string(&path).map_err(|e| {
        DomainError::Configuration(format!("Cannot read prompt template {}: {e}", path.display()))
    })
}

/// Render the feedback block shown to the reviewer and the generator.
///
/// The block carries the specification, the stripped code and the
/// diagnostic of the failing stage.
pub fn build_feedback(
    specification: &str,
    stripped_code: &str,
    class: FailureClass,
    result: &VerificationResult,
) -> DomainResult<String> {
    let (label, diagnostic) = match class {
        FailureClass::StructuralCompile => ("SBT ERROR INFO:", &result.structural_compile_error),
        FailureClass::LowLevelCompile => ("IV ERROR INFO:", &result.lowlevel_compile_error),
        FailureClass::Functional => ("VVP OUTPUT:", &result.execution_output),
        FailureClass::None => {
            return Err(DomainError::InvariantViolation(
                "no feedback for a passing result".to_string(),
            ))
        }
    };

    Ok(format!(
        "SPECIFICATION:\n```\n{specification}\n```\n\n\
         CHISEL CODE:\n```scala\n{stripped_code}\n```\n\n\
         {label}\n```\n{diagnostic}\n```\n"
    ))
}
