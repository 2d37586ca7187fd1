//! Failure classifier and correction router.
//!
//! [`classify`] scans a verification result in pipeline order and reports
//! the first failing stage; [`route`] picks the repair strategy for it. An
//! execution stage that did not pass (a simulation timeout) is routed with
//! functional failures, since its output is what the functionality reviewer
//! reads.

use crate::domain::errors::DomainResult;
use crate::domain::models::{FailureClass, RepairStrategy, VerificationResult};

/// Map a verification result to its failure class.
///
/// # Errors
///
/// Returns [`DomainError::InvariantViolation`] when the result records a
/// later stage passing after an earlier one failed.
///
/// [`DomainError::InvariantViolation`]: crate::domain::errors::DomainError::InvariantViolation
pub fn classify(result: &VerificationResult) -> DomainResult<FailureClass> {
    result.validate()?;

    let class = if !result.structural_compile_ok {
        FailureClass::StructuralCompile
    } else if !result.lowlevel_compile_ok {
        FailureClass::LowLevelCompile
    } else if !result.execution_ok || !result.functionally_correct {
        FailureClass::Functional
    } else {
        FailureClass::None
    };

    tracing::debug!(failure_class = %class, "Classified verification result");
    Ok(class)
}

/// Select the repair strategy for a failure class; `None` ends the loop.
pub fn route(class: FailureClass) -> Option<RepairStrategy> {
    match class {
        FailureClass::None => None,
        FailureClass::StructuralCompile | FailureClass::LowLevelCompile => {
            Some(RepairStrategy::SyntaxRepair)
        }
        FailureClass::Functional => Some(RepairStrategy::FunctionalityRepair),
    }
}
