//! AutoChip (HDLBits) benchmark.
//!
//! Problem ids are the stems of the `*.txt` specifications in the prompt
//! directory; each id's self-checking testbench lives at
//! `{reference_dir}/{id}.v` and is copied to `test.v`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Fixture, FunctionalPredicate, Problem};
use crate::domain::ports::Benchmark;

pub struct AutoChipBenchmark {
    prompt_dir: PathBuf,
    reference_dir: PathBuf,
    exclusion_file: Option<PathBuf>,
}

impl AutoChipBenchmark {
    pub fn new(prompt_dir: impl Into<PathBuf>, reference_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompt_dir: prompt_dir.into(),
            reference_dir: reference_dir.into(),
            exclusion_file: None,
        }
    }

    /// Leave out ids listed in `path`. A missing file excludes nothing.
    pub fn with_exclusion_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclusion_file = Some(path.into());
        self
    }

    fn exclusions(&self) -> DomainResult<Vec<Exclusion>> {
        let Some(path) = &self.exclusion_file else {
            return Ok(Vec::new());
        };
        match std::fs::read_to_string(path) {
            Ok(contents) => parse_exclusions(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// One line of the exclusion file.
#[derive(Debug)]
enum Exclusion {
    Exact(String),
    /// Lines containing `*` are regular expressions matched at the start.
    Pattern(Regex),
}

impl Exclusion {
    fn matches(&self, id: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == id,
            Self::Pattern(re) => re.is_match(id),
        }
    }
}

fn parse_exclusions(contents: &str) -> DomainResult<Vec<Exclusion>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.contains('*') {
                Regex::new(&format!("^(?:{line})"))
                    .map(Exclusion::Pattern)
                    .map_err(|e| {
                        DomainError::Configuration(format!(
                            "Invalid exclusion pattern `{line}`: {e}"
                        ))
                    })
            } else {
                Ok(Exclusion::Exact(line.to_string()))
            }
        })
        .collect()
}

fn read_problem_file(id: &str, path: &Path) -> DomainResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        DomainError::ProblemNotFound(format!("{id}: cannot read {}: {e}", path.display()))
    })
}

impl Benchmark for AutoChipBenchmark {
    fn name(&self) -> &'static str {
        "autochip"
    }

    fn top_module(&self) -> &'static str {
        "top_module"
    }

    fn predicate(&self) -> FunctionalPredicate {
        FunctionalPredicate::AllTestsPassed
    }

    fn problem_ids(&self) -> DomainResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.prompt_dir).map_err(|e| {
            DomainError::Configuration(format!(
                "Cannot read prompt directory {}: {e}",
                self.prompt_dir.display()
            ))
        })?;

        let mut ids = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.insert(stem.to_string());
            }
        }

        let exclusions = self.exclusions()?;
        ids.retain(|id| !exclusions.iter().any(|ex| ex.matches(id)));

        tracing::debug!(
            benchmark = self.name(),
            problems = ids.len(),
            exclusions = exclusions.len(),
            "Listed problems"
        );
        Ok(ids.into_iter().collect())
    }

    fn load(&self, id: &str) -> DomainResult<Problem> {
        let specification = read_problem_file(id, &self.prompt_dir.join(format!("{id}.txt")))?;
        let testbench = read_problem_file(id, &self.reference_dir.join(format!("{id}.v")))?;

        Ok(Problem::new(id, specification, self.top_module())
            .with_fixture(Fixture::new("test.v", testbench)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(ids: &[&str]) -> (tempfile::TempDir, AutoChipBenchmark) {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join("prompts");
        let refs = dir.path().join("refs");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::create_dir_all(&refs).unwrap();
        for id in ids {
            std::fs::write(prompts.join(format!("{id}.txt")), format!("spec for {id}")).unwrap();
            std::fs::write(refs.join(format!("{id}.v")), "module tb; endmodule").unwrap();
        }
        std::fs::write(prompts.join("README.md"), "not a problem").unwrap();
        let bench = AutoChipBenchmark::new(prompts, refs);
        (dir, bench)
    }

    #[test]
    fn ids_come_from_prompt_files() {
        let (_dir, bench) = setup(&["mux2to1", "andgate"]);
        assert_eq!(bench.problem_ids().unwrap(), vec!["andgate", "mux2to1"]);
    }

    #[test]
    fn exclusions_support_exact_and_patterns() {
        let (dir, bench) = setup(&["andgate", "fsm1", "fsm2", "mux2to1", "xfsm"]);
        let exclusions = dir.path().join("exclude.txt");
        std::fs::write(&exclusions, "mux2to1\nfsm.*\n").unwrap();
        let bench = bench.with_exclusion_file(&exclusions);

        assert_eq!(bench.problem_ids().unwrap(), vec!["andgate", "xfsm"]);
    }

    #[test]
    fn missing_exclusion_file_excludes_nothing() {
        let (dir, bench) = setup(&["andgate"]);
        let bench = bench.with_exclusion_file(dir.path().join("absent.txt"));
        assert_eq!(bench.problem_ids().unwrap(), vec!["andgate"]);
    }

    #[test]
    fn load_copies_testbench_as_test_v() {
        let (_dir, bench) = setup(&["andgate"]);
        let problem = bench.load("andgate").unwrap();
        assert_eq!(problem.specification, "spec for andgate");
        assert_eq!(problem.top_module, "top_module");
        assert_eq!(problem.fixtures.len(), 1);
        assert_eq!(problem.fixtures[0].file_name, "test.v");
    }
}
