//! Failure classes and repair strategies.

use serde::{Deserialize, Serialize};

/// The first failing stage of a verification result, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    None,
    StructuralCompile,
    LowLevelCompile,
    Functional,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StructuralCompile => "structural_compile",
            Self::LowLevelCompile => "lowlevel_compile",
            Self::Functional => "functional",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair procedure selected for a failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Reflect on a compiler diagnostic, then request a corrected artifact.
    SyntaxRepair,
    /// Reflect on simulation output, then request a corrected artifact.
    FunctionalityRepair,
}

impl RepairStrategy {
    /// Tag used for the `type` field of a repair try in the result record.
    pub fn try_kind(&self) -> &'static str {
        match self {
            Self::SyntaxRepair => "syntax",
            Self::FunctionalityRepair => "functionality",
        }
    }
}
