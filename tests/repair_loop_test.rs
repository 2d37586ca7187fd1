//! Repair loop scenarios driven by a mock provider and a scripted verifier.

mod common;

use std::sync::Arc;

use common::*;
use rechisel::adapters::providers::MockProvider;
use rechisel::application::{LoopState, RepairLoop, RepairLoopConfig};
use rechisel::domain::models::{
    FunctionalPredicate, Problem, SessionOutcome, TryKind, Workspace,
};
use rechisel::domain::ports::ProviderError;
use rechisel::services::{PromptSet, RepairAgent};
use rechisel::DomainError;
use uuid::Uuid;

fn problem() -> Problem {
    Problem::new(
        "Prob042_counter",
        "Build a 4-bit counter with synchronous reset.",
        "TopModule",
    )
}

fn workspace() -> Workspace {
    Workspace::new(Uuid::new_v4(), std::env::temp_dir().join("rechisel-unused"))
}

#[tokio::test]
async fn structural_failure_is_repaired_with_syntax_strategy() {
    setup_test_logging();
    let first = module("TopModule", "val count = RegInit(0.U(4.W)");
    let second = module("TopModule", "val count = RegInit(0.U(4.W))");

    let provider = Arc::new(
        MockProvider::new("mock")
            .with_response(scala(&first))
            .with_response("Line 4 is missing a closing parenthesis.")
            .with_response(scala(&second)),
    );
    let verifier = Arc::new(
        ScriptedVerifier::new()
            .then(structural_failure("[error] syntax error line 4"))
            .then(passing()),
    );
    let repair_loop = repair_loop(provider.clone(), verifier.clone(), loop_config(5));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    let record = session.record();

    assert_eq!(session.state(), LoopState::Success);
    assert!(record.success);
    assert_eq!(record.tries.len(), 1);
    assert_eq!(record.tries[0].kind, TryKind::Syntax);
    assert!(!record
        .initial_verify_result
        .as_ref()
        .unwrap()
        .structural_compile_ok);

    let seen = verifier.seen();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].2, seen[1].2, "repair must produce a new candidate");

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1][0].content, "SYSTEM sbt reflection");
    assert!(requests[1][1].content.contains("SBT ERROR INFO:"));
    assert!(requests[1][1].content.contains("syntax error line 4"));
    assert_eq!(requests[2][0].content, "SYSTEM syntax correction");
    assert_eq!(
        requests[2].last().unwrap().content,
        "Line 4 is missing a closing parenthesis."
    );
}

#[tokio::test]
async fn passing_initial_candidate_succeeds_without_repair() {
    let provider = Arc::new(
        MockProvider::new("mock").with_response(scala(&module("TopModule", "io := DontCare"))),
    );
    let verifier = Arc::new(ScriptedVerifier::new().then(simulated(
        "Mismatches: 0 in 128 samples",
        FunctionalPredicate::MismatchCount,
    )));
    let repair_loop = repair_loop(provider.clone(), verifier, loop_config(5));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    let record = session.into_record();

    assert!(record.success);
    assert_eq!(record.outcome, SessionOutcome::Success);
    assert!(record.tries.is_empty());
    assert!(record.first_try_success());
    assert_eq!(record.iterations, 0);
    assert!(record.final_code.unwrap().contains("class TopModule"));
    assert!(record.final_verify_result.unwrap().functionally_correct);
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn persistent_mismatch_exhausts_budget() {
    let provider = Arc::new(
        MockProvider::new("mock").with_fallback(scala(&module("TopModule", "io := DontCare"))),
    );
    let verifier = Arc::new(ScriptedVerifier::new().always(simulated(
        "Mismatches: 3 in 128 samples",
        FunctionalPredicate::MismatchCount,
    )));
    let repair_loop = repair_loop(provider.clone(), verifier.clone(), loop_config(2));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();

    assert_eq!(session.state(), LoopState::Exhausted);
    assert_eq!(session.iteration(), 2);
    assert_eq!(session.trace().len(), 2);

    let record = session.record();
    assert!(!record.success);
    assert_eq!(record.outcome, SessionOutcome::Exhausted);
    assert_eq!(record.tries.len(), 2);
    assert!(record
        .tries
        .iter()
        .all(|t| t.kind == TryKind::Functionality));
    assert!(!record.final_verify_result.as_ref().unwrap().functionally_correct);
    assert_eq!(verifier.calls(), 3);

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[1][0].content, "SYSTEM functionality reflection");
    assert!(requests[1][1].content.contains("VVP OUTPUT:"));
    assert!(requests[1][1].content.contains("Mismatches: 3 in 128 samples"));
    assert_eq!(requests[2][0].content, "SYSTEM functionality correction");
}

#[tokio::test]
async fn initial_response_without_code_is_parse_error() {
    let provider = Arc::new(MockProvider::new("mock").with_response("I would need more detail."));
    let verifier = Arc::new(ScriptedVerifier::new());
    let repair_loop = repair_loop(provider, verifier.clone(), loop_config(5));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    let record = session.record();

    assert_eq!(session.state(), LoopState::ParseError);
    assert_eq!(record.outcome, SessionOutcome::ParseError);
    assert!(!record.success);
    assert_eq!(
        record.initial_generation.as_deref(),
        Some("I would need more detail.")
    );
    assert!(record.initial_verify_result.is_none());
    assert_eq!(verifier.calls(), 0);
}

#[tokio::test]
async fn correction_without_code_records_try_and_stops() {
    let provider = Arc::new(
        MockProvider::new("mock")
            .with_response(scala(&module("TopModule", "io.out := io.in")))
            .with_response("The port `out` does not exist in the testbench.")
            .with_response("Sorry, I am not sure how to fix this."),
    );
    let verifier = Arc::new(
        ScriptedVerifier::new()
            .then(lowlevel_failure("Error: Cannot run Icarus Verilog.\nunknown port out")),
    );
    let repair_loop = repair_loop(provider.clone(), verifier.clone(), loop_config(5));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    let record = session.record();

    assert_eq!(session.state(), LoopState::ParseError);
    assert_eq!(record.tries.len(), 1);
    assert_eq!(record.tries[0].kind, TryKind::Syntax);
    assert!(record.tries[0].verify_result.is_none());
    assert!(record.final_code.as_ref().unwrap().contains("io.out := io.in"));
    assert_eq!(verifier.calls(), 1);
    assert_eq!(provider.requests()[1][0].content, "SYSTEM iv reflection");
}

#[tokio::test]
async fn in_context_window_ends_with_the_attempt_being_repaired() {
    let provider = Arc::new(
        MockProvider::new("mock").with_fallback(scala(&module("TopModule", "io := DontCare"))),
    );
    let verifier = Arc::new(ScriptedVerifier::new().always(structural_failure("[error] boom")));
    let config = RepairLoopConfig {
        max_iterations: 3,
        use_in_context_history: true,
        window: 1,
    };
    let repair_loop = repair_loop(provider.clone(), verifier, config);

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    assert_eq!(session.state(), LoopState::Exhausted);

    let requests = provider.requests();
    assert_eq!(requests.len(), 7);

    // Every correction, the first included, carries a one-attempt window.
    for correction in [&requests[2], &requests[4], &requests[6]] {
        assert_eq!(correction.len(), 5);
        let history = &correction[2].content;
        assert!(history.starts_with("Below are the most recent"));
        assert!(history.contains("## Attempt 1"));
        assert!(!history.contains("## Attempt 2"));
    }
}

#[tokio::test]
async fn in_context_window_lists_attempts_in_generation_order() {
    let provider = Arc::new(
        MockProvider::new("mock")
            .with_response(scala(&module("TopModule", "val v0 = 0.U")))
            .with_response("Reflection one")
            .with_response(scala(&module("TopModule", "val v1 = 1.U")))
            .with_response("Reflection two")
            .with_response(scala(&module("TopModule", "val v2 = 2.U"))),
    );
    let verifier = Arc::new(ScriptedVerifier::new().always(structural_failure("[error] boom")));
    let config = RepairLoopConfig {
        max_iterations: 2,
        use_in_context_history: true,
        window: 4,
    };
    let repair_loop = repair_loop(provider.clone(), verifier, config);

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    assert_eq!(session.state(), LoopState::Exhausted);

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);

    let first = &requests[2][2].content;
    assert!(first.contains("## Attempt 1"));
    assert!(first.contains("val v0 = 0.U"));
    assert!(first.contains("Summary: Reflection one"));
    assert!(!first.contains("## Attempt 2"));

    let second = &requests[4][2].content;
    let attempt_one = second.find("## Attempt 1").unwrap();
    let attempt_two = second.find("## Attempt 2").unwrap();
    assert!(attempt_one < attempt_two);
    assert!(second[attempt_two..].contains("val v1 = 1.U"));
    assert!(second[attempt_two..].contains("Summary: Reflection two"));
}

#[tokio::test]
async fn attempt_summaries_are_kept_in_the_record() {
    let provider = Arc::new(
        MockProvider::new("mock")
            .with_response(scala(&module("TopModule", "val v0 = 0.U")))
            .with_response("A long reflection about line 4.")
            .with_response("Close the parenthesis on line 4.")
            .with_response(scala(&module("TopModule", "val v1 = 1.U"))),
    );
    let verifier = Arc::new(
        ScriptedVerifier::new()
            .then(structural_failure("[error] syntax error line 4"))
            .then(passing()),
    );
    let prompts = PromptSet {
        attempt_summary: Some("SYSTEM attempt summary".into()),
        ..prompt_set()
    };
    let agent = RepairAgent::new(
        prompts,
        provider.clone(),
        provider.clone(),
        provider.clone(),
        Some(provider.clone()),
    );
    let repair_loop = RepairLoop::new(Arc::new(agent), verifier, loop_config(5));

    let session = repair_loop.run(&problem(), &workspace()).await.unwrap();
    assert_eq!(session.state(), LoopState::Success);

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[2][0].content, "SYSTEM attempt summary");
    assert!(requests[2][2].content.starts_with("# Reviewer Response:"));

    let attempt = session.trace().iter().next().unwrap();
    assert_eq!(attempt.summary(), "Close the parenthesis on line 4.");

    let record = session.into_record();
    assert_eq!(record.tries.len(), 1);
    assert_eq!(record.tries[0].reflection, "A long reflection about line 4.");
    assert_eq!(
        record.tries[0].summary.as_deref(),
        Some("Close the parenthesis on line 4.")
    );
}

#[tokio::test]
async fn provider_fault_ends_session_with_error() {
    let provider = Arc::new(
        MockProvider::new("mock").with_error(ProviderError::AuthError("invalid key".into())),
    );
    let verifier = Arc::new(ScriptedVerifier::new());
    let repair_loop = repair_loop(provider, verifier.clone(), loop_config(5));

    let err = repair_loop.run(&problem(), &workspace()).await.unwrap_err();
    assert!(matches!(err, DomainError::Provider(_)));
    assert_eq!(verifier.calls(), 0);
}
