//! Repair loop controller.
//!
//! Drives one session through generate → verify → classify → repair →
//! re-verify until a candidate passes the functional check or the iteration
//! budget runs out.
//!
//! ```text
//! Init → Generating → Verifying ─┬→ Success
//!                                ├→ Exhausted
//!                                └→ Classifying → Repairing → Verifying (loop)
//! ```
//!
//! A response without a fenced code region ends the session in
//! `ParseError` without running verification.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Attempt, CandidateArtifact, Config, Problem, RepairTry, SessionOutcome, TaskRecord,
    VerificationResult, Workspace,
};
use crate::domain::ports::Verifier;
use crate::services::classifier::{classify, route};
use crate::services::history::{format_in_context, History};
use crate::services::prompts::build_feedback;
use crate::services::repair_agent::RepairAgent;

/// States of the repair loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Init,
    Generating,
    Verifying,
    Classifying,
    Repairing,
    Success,
    Exhausted,
    /// A response contained no extractable code.
    ParseError,
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Exhausted | Self::ParseError)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Generating)
                | (Self::Generating, Self::Verifying | Self::ParseError)
                | (Self::Verifying, Self::Success | Self::Exhausted | Self::Classifying)
                | (Self::Classifying, Self::Repairing)
                | (Self::Repairing, Self::Verifying | Self::ParseError)
        )
    }
}

/// Loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairLoopConfig {
    /// Maximum number of repair iterations
    pub max_iterations: usize,
    /// Feed the context window into correction prompts
    pub use_in_context_history: bool,
    /// Capacity of the context window
    pub window: usize,
}

impl Default for RepairLoopConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RepairLoopConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_iterations: config.max_iterations,
            use_in_context_history: config.history.use_in_context_history,
            window: config.history.window,
        }
    }
}

/// State of one problem's run through the loop.
///
/// Holds the full attempt trace and the bounded context window as separate
/// histories, plus the result record being built.
#[derive(Debug)]
pub struct Session {
    problem_id: String,
    state: LoopState,
    iteration: usize,
    trace: History<Attempt>,
    window: History<Attempt>,
    record: TaskRecord,
}

impl Session {
    fn new(problem: &Problem, window: usize) -> Self {
        Self {
            problem_id: problem.id.clone(),
            state: LoopState::Init,
            iteration: 0,
            trace: History::unbounded(),
            window: History::bounded(window),
            record: TaskRecord::begin(&problem.id),
        }
    }

    fn transition(&mut self, next: LoopState) -> DomainResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvariantViolation(format!(
                "illegal loop transition {:?} -> {next:?}",
                self.state
            )));
        }
        tracing::trace!(
            problem_id = %self.problem_id,
            from = ?self.state,
            to = ?next,
            "Loop transition"
        );
        self.state = next;
        Ok(())
    }

    /// Append a finished attempt to both histories and advance the counter.
    fn push_attempt(&mut self, attempt: Attempt) {
        self.window.add(attempt.clone());
        self.trace.add(attempt);
        self.iteration += 1;
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        self.record.iterations = self.iteration;
        self.record = std::mem::replace(&mut self.record, TaskRecord::begin(&self.problem_id))
            .finish(outcome);
    }

    fn close(
        &mut self,
        state: LoopState,
        outcome: SessionOutcome,
        last: Option<(&CandidateArtifact, &VerificationResult)>,
    ) -> DomainResult<()> {
        self.transition(state)?;
        if let Some((artifact, result)) = last {
            self.record.final_code = Some(artifact.code().to_string());
            self.record.final_verify_result = Some(result.clone());
        }
        self.finish(outcome);
        Ok(())
    }

    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Every attempt in generation order.
    pub fn trace(&self) -> &History<Attempt> {
        &self.trace
    }

    pub fn record(&self) -> &TaskRecord {
        &self.record
    }

    pub fn into_record(self) -> TaskRecord {
        self.record
    }
}

/// The loop controller; stateless across sessions.
pub struct RepairLoop {
    agent: Arc<RepairAgent>,
    verifier: Arc<dyn Verifier>,
    config: RepairLoopConfig,
}

impl RepairLoop {
    pub fn new(
        agent: Arc<RepairAgent>,
        verifier: Arc<dyn Verifier>,
        config: RepairLoopConfig,
    ) -> Self {
        Self {
            agent,
            verifier,
            config,
        }
    }

    pub fn config(&self) -> &RepairLoopConfig {
        &self.config
    }

    pub fn agent(&self) -> &RepairAgent {
        &self.agent
    }

    /// Run a session for `problem` in `workspace` to a terminal state.
    ///
    /// Failing candidates never produce an `Err`; errors are infrastructure,
    /// provider or invariant faults.
    #[instrument(skip_all, fields(problem_id = %problem.id, workspace_id = %workspace.id()))]
    pub async fn run(&self, problem: &Problem, workspace: &Workspace) -> DomainResult<Session> {
        let mut session = Session::new(problem, self.config.window);

        session.transition(LoopState::Generating)?;
        let response = self.agent.generate(problem).await?;
        session.record.initial_generation = Some(response.clone());

        let mut artifact = match CandidateArtifact::from_response(&response, &problem.top_module) {
            Ok(artifact) => artifact,
            Err(DomainError::ParseError(reason)) => {
                warn!(%reason, "Initial generation has no code");
                session.close(LoopState::ParseError, SessionOutcome::ParseError, None)?;
                return Ok(session);
            }
            Err(e) => return Err(e),
        };

        session.transition(LoopState::Verifying)?;
        let mut result = self.verifier.verify(&artifact, problem, workspace).await?;
        session.record.initial_verify_result = Some(result.clone());

        loop {
            if result.is_success() {
                info!(iteration = session.iteration, "Candidate passed functional check");
                session.close(
                    LoopState::Success,
                    SessionOutcome::Success,
                    Some((&artifact, &result)),
                )?;
                break;
            }
            if session.iteration >= self.config.max_iterations {
                info!(iteration = session.iteration, "Iteration budget exhausted");
                session.close(
                    LoopState::Exhausted,
                    SessionOutcome::Exhausted,
                    Some((&artifact, &result)),
                )?;
                break;
            }

            session.transition(LoopState::Classifying)?;
            let class = classify(&result)?;
            let strategy = route(class).ok_or_else(|| {
                DomainError::InvariantViolation("failing result classified as passing".to_string())
            })?;
            info!(
                iteration = session.iteration,
                failure_class = %class,
                strategy = strategy.try_kind(),
                "Repairing candidate"
            );

            session.transition(LoopState::Repairing)?;
            let feedback =
                build_feedback(&problem.specification, artifact.stripped(), class, &result)?;
            let reflection = self.agent.reflect(class, &feedback).await?;
            let summary = self.agent.summarize(&feedback, &reflection).await?;
            session.push_attempt(Attempt::new(
                artifact.clone(),
                result.clone(),
                reflection.clone(),
                summary.clone(),
            ));

            // The window now ends with the attempt being repaired.
            let in_context = if self.config.use_in_context_history {
                format_in_context(session.window.iter())
            } else {
                None
            };
            let correction = self
                .agent
                .correct(
                    strategy,
                    &problem.specification,
                    in_context.as_deref(),
                    &feedback,
                    &reflection,
                )
                .await?;

            let next = match CandidateArtifact::from_response(&correction, &problem.top_module) {
                Ok(next) => next,
                Err(DomainError::ParseError(reason)) => {
                    warn!(iteration = session.iteration, %reason, "Correction has no code");
                    session.record.tries.push(RepairTry {
                        kind: strategy.into(),
                        reflection,
                        summary,
                        correction_result: correction,
                        verify_result: None,
                    });
                    session.close(
                        LoopState::ParseError,
                        SessionOutcome::ParseError,
                        Some((&artifact, &result)),
                    )?;
                    break;
                }
                Err(e) => return Err(e),
            };

            session.transition(LoopState::Verifying)?;
            result = self.verifier.verify(&next, problem, workspace).await?;
            session.record.tries.push(RepairTry {
                kind: strategy.into(),
                reflection,
                summary,
                correction_result: correction,
                verify_result: Some(result.clone()),
            });
            artifact = next;
        }

        info!(
            outcome = session.record.outcome.as_str(),
            iterations = session.iteration,
            "Session finished"
        );
        Ok(session)
    }
}
