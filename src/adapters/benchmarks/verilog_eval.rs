//! VerilogEval spec-to-RTL benchmark.
//!
//! Layout of the benchmark directory:
//!
//! - `problems.txt`: one problem id per line
//! - `{id}_prompt.txt`: natural-language specification
//! - `{id}_ref.sv`: reference model, copied to `ref.sv`
//! - `{id}_test.sv`: testbench, copied to `test.sv`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Fixture, FunctionalPredicate, Problem};
use crate::domain::ports::Benchmark;

pub struct VerilogEvalBenchmark {
    dir: PathBuf,
    problem_list: String,
}

impl VerilogEvalBenchmark {
    pub fn new(dir: impl Into<PathBuf>, problem_list: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            problem_list: problem_list.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, id: &str, file_name: &str) -> DomainResult<String> {
        let path = self.dir.join(file_name);
        std::fs::read_to_string(&path).map_err(|e| {
            DomainError::ProblemNotFound(format!("{id}: cannot read {}: {e}", path.display()))
        })
    }
}

impl Benchmark for VerilogEvalBenchmark {
    fn name(&self) -> &'static str {
        "verilog-eval"
    }

    fn top_module(&self) -> &'static str {
        "TopModule"
    }

    fn predicate(&self) -> FunctionalPredicate {
        FunctionalPredicate::MismatchCount
    }

    fn problem_ids(&self) -> DomainResult<Vec<String>> {
        let path = self.dir.join(&self.problem_list);
        let list = std::fs::read_to_string(&path).map_err(|e| {
            DomainError::Configuration(format!(
                "Cannot read problem list {}: {e}",
                path.display()
            ))
        })?;

        let ids: BTreeSet<String> = list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn load(&self, id: &str) -> DomainResult<Problem> {
        let specification = self.read(id, &format!("{id}_prompt.txt"))?;
        let reference = self.read(id, &format!("{id}_ref.sv"))?;
        let testbench = self.read(id, &format!("{id}_test.sv"))?;

        Ok(Problem::new(id, specification, self.top_module())
            .with_fixture(Fixture::new("ref.sv", reference))
            .with_fixture(Fixture::new("test.sv", testbench)))
    }
}
