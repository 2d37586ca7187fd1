//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test doubles used across
//! multiple integration test files.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use rechisel::adapters::providers::MockProvider;
use rechisel::application::{RepairLoop, RepairLoopConfig};
use rechisel::domain::models::{
    CandidateArtifact, Fixture, FunctionalPredicate, Problem, VerificationResult, Workspace,
};
use rechisel::domain::ports::{Benchmark, Verifier};
use rechisel::services::{PromptSet, RepairAgent};
use rechisel::{DomainError, DomainResult};

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wrap code in a Scala fence the way a model answers.
pub fn scala(body: &str) -> String {
    format!("Here is the design:\n\n```scala\n{body}\n```\n")
}

pub fn module(name: &str, logic: &str) -> String {
    format!("class {name} extends Module {{\n  val io = IO(new Bundle {{}})\n  {logic}\n}}")
}

pub fn prompt_set() -> PromptSet {
    PromptSet {
        init_gen: "SYSTEM init generation".into(),
        sbt_reflection: "SYSTEM sbt reflection".into(),
        iv_reflection: "SYSTEM iv reflection".into(),
        syntax_correction: "SYSTEM syntax correction".into(),
        functionality_reflection: "SYSTEM functionality reflection".into(),
        functionality_correction: "SYSTEM functionality correction".into(),
        attempt_summary: None,
    }
}

/// A project template with just enough structure to be copied.
pub fn template_dir(root: &Path) -> PathBuf {
    let template = root.join("template");
    std::fs::create_dir_all(template.join("project")).unwrap();
    std::fs::write(template.join("build.sbt"), "scalaVersion := \"2.13.12\"\n").unwrap();
    std::fs::write(template.join("project/build.properties"), "sbt.version=1.9.7\n").unwrap();
    template
}

/// Build a repair loop around a single mock provider serving every role.
pub fn repair_loop(
    provider: Arc<MockProvider>,
    verifier: Arc<dyn Verifier>,
    config: RepairLoopConfig,
) -> RepairLoop {
    let agent = RepairAgent::new(
        prompt_set(),
        provider.clone(),
        provider.clone(),
        provider,
        None,
    );
    RepairLoop::new(Arc::new(agent), verifier, config)
}

pub fn loop_config(max_iterations: usize) -> RepairLoopConfig {
    RepairLoopConfig {
        max_iterations,
        use_in_context_history: false,
        window: 4,
    }
}

pub fn structural_failure(diagnostic: &str) -> VerificationResult {
    VerificationResult::builder()
        .structural_failed(diagnostic)
        .build()
        .unwrap()
}

pub fn lowlevel_failure(diagnostic: &str) -> VerificationResult {
    VerificationResult::builder()
        .structural_passed("module TopModule(); endmodule")
        .lowlevel_failed(diagnostic)
        .build()
        .unwrap()
}

/// A result that ran to the functional check with `output`.
pub fn simulated(output: &str, predicate: FunctionalPredicate) -> VerificationResult {
    VerificationResult::builder()
        .structural_passed("module TopModule(); endmodule")
        .lowlevel_passed()
        .execution_passed(output)
        .functional(predicate.evaluate(output))
        .build()
        .unwrap()
}

pub fn passing() -> VerificationResult {
    simulated("Mismatches: 0 in 128 samples", FunctionalPredicate::MismatchCount)
}

/// Verifier double serving scripted results and watching workspace use.
#[derive(Default)]
pub struct ScriptedVerifier {
    script: Mutex<VecDeque<VerificationResult>>,
    fallback: Option<VerificationResult>,
    delay: Duration,
    calls: AtomicUsize,
    overlaps: AtomicUsize,
    busy: Mutex<HashSet<Uuid>>,
    seen: Mutex<Vec<(String, Uuid, String)>>,
}

impl ScriptedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, result: VerificationResult) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn always(mut self, result: VerificationResult) -> Self {
        self.fallback = Some(result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Times a workspace was used by two verifications at once.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    /// `(problem id, workspace id, stripped code)` per call, in call order.
    pub fn seen(&self) -> Vec<(String, Uuid, String)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn problem_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for (problem, _, _) in self.seen() {
            *counts.entry(problem).or_insert(0) += 1;
        }
        counts
    }

    pub fn workspaces(&self) -> HashSet<Uuid> {
        self.seen().into_iter().map(|(_, ws, _)| ws).collect()
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn verify(
        &self,
        artifact: &CandidateArtifact,
        problem: &Problem,
        workspace: &Workspace,
    ) -> DomainResult<VerificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.busy.lock().unwrap().insert(workspace.id()) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        self.seen.lock().unwrap().push((
            problem.id.clone(),
            workspace.id(),
            artifact.stripped().to_string(),
        ));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.busy.lock().unwrap().remove(&workspace.id());

        let next = self.script.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| DomainError::Infrastructure("verifier script exhausted".to_string()))
    }
}

/// In-memory benchmark of `count` problems named `p00`, `p01`, ...
pub struct StaticBenchmark {
    ids: Vec<String>,
    missing: HashSet<String>,
}

impl StaticBenchmark {
    pub fn new(count: usize) -> Self {
        Self {
            ids: (0..count).map(|i| format!("p{i:02}")).collect(),
            missing: HashSet::new(),
        }
    }

    /// Make `load` fail for `id`.
    pub fn with_broken(mut self, id: &str) -> Self {
        self.missing.insert(id.to_string());
        self
    }
}

impl Benchmark for StaticBenchmark {
    fn name(&self) -> &'static str {
        "static"
    }

    fn top_module(&self) -> &'static str {
        "TopModule"
    }

    fn predicate(&self) -> FunctionalPredicate {
        FunctionalPredicate::MismatchCount
    }

    fn problem_ids(&self) -> DomainResult<Vec<String>> {
        Ok(self.ids.clone())
    }

    fn load(&self, id: &str) -> DomainResult<Problem> {
        if self.missing.contains(id) {
            return Err(DomainError::ProblemNotFound(id.to_string()));
        }
        Ok(
            Problem::new(id, format!("Implement problem {id}."), "TopModule")
                .with_fixture(Fixture::new("test.sv", "module tb; endmodule")),
        )
    }
}

/// Write a shell script used as a fake toolchain command.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    path
}
