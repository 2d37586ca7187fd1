//! Problem instances and functional-check predicates.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Marker printed by AutoChip-style testbenches when every check passed.
pub const ALL_TESTS_PASSED_MARKER: &str = "All tests passed!";

static MISMATCH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Mismatches: (\d+) in (\d+) samples").expect("valid mismatch regex")
});

/// A file copied into the low-level region of a workspace before every
/// verification (reference model, testbench).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// File name relative to the low-level region.
    pub file_name: String,
    pub contents: String,
}

impl Fixture {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// One problem instance: a natural-language specification and the fixtures
/// needed to check a candidate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub specification: String,
    /// Top-level module name the generated design must expose.
    pub top_module: String,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
}

impl Problem {
    pub fn new(
        id: impl Into<String>,
        specification: impl Into<String>,
        top_module: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            specification: specification.into(),
            top_module: top_module.into(),
            fixtures: Vec::new(),
        }
    }

    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }
}

/// Benchmark-specific success predicate applied to simulation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionalPredicate {
    /// Succeeds iff [`ALL_TESTS_PASSED_MARKER`] appears in the output.
    AllTestsPassed,
    /// Succeeds iff a `Mismatches: N in M samples` line reports `N == 0`.
    MismatchCount,
}

impl FunctionalPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllTestsPassed => "all-tests-passed",
            Self::MismatchCount => "mismatch-count",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all-tests-passed" | "autochip" => Some(Self::AllTestsPassed),
            "mismatch-count" | "verilog-eval" => Some(Self::MismatchCount),
            _ => None,
        }
    }

    pub fn evaluate(&self, output: &str) -> bool {
        match self {
            Self::AllTestsPassed => output.contains(ALL_TESTS_PASSED_MARKER),
            Self::MismatchCount => MISMATCH_LINE
                .captures(output)
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .is_some_and(|mismatches| mismatches == 0),
        }
    }
}
