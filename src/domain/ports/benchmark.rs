//! Benchmark port.

use crate::domain::errors::DomainResult;
use crate::domain::models::{FunctionalPredicate, Problem};

/// A suite of problem instances sharing one success predicate.
pub trait Benchmark: Send + Sync {
    /// Benchmark name (e.g. "verilog-eval")
    fn name(&self) -> &'static str;

    /// Top-level module name every problem must expose
    fn top_module(&self) -> &'static str;

    /// Predicate applied to simulation output
    fn predicate(&self) -> FunctionalPredicate;

    /// All problem identifiers, sorted
    fn problem_ids(&self) -> DomainResult<Vec<String>>;

    /// Load a single problem with its fixtures
    fn load(&self, id: &str) -> DomainResult<Problem>;
}
