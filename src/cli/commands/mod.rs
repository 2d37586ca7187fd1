//! CLI command implementations.

pub mod eval;
pub mod run;
pub mod solve;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::providers::ProviderRegistry;
use crate::application::{RepairLoop, RepairLoopConfig};
use crate::domain::models::{Config, FunctionalPredicate};
use crate::infrastructure::RetryPolicy;
use crate::services::{RepairAgent, StageRunner};

/// Wire providers, prompts and the stage runner into a repair loop.
///
/// Missing credentials and missing prompt templates surface here, before
/// any task is dequeued.
pub(crate) fn build_repair_loop(
    config: &Config,
    predicate: FunctionalPredicate,
) -> Result<Arc<RepairLoop>> {
    let registry =
        ProviderRegistry::new(config.providers.clone(), RetryPolicy::from(&config.retry));
    let agent = RepairAgent::from_config(config, &registry)
        .context("Failed to set up completion providers and prompts")?;
    let verifier = StageRunner::from_config(&config.toolchain, predicate);

    Ok(Arc::new(RepairLoop::new(
        Arc::new(agent),
        Arc::new(verifier),
        RepairLoopConfig::from(config),
    )))
}

/// Apply command-line overrides shared by `run` and `solve`.
pub(crate) fn apply_overrides(
    config: &mut Config,
    model: Option<&str>,
    max_iterations: Option<usize>,
    in_context_history: bool,
    llm_summary: bool,
) {
    if let Some(model) = model {
        config.models = crate::domain::models::ModelsConfig::uniform(model);
    }
    if let Some(max_iterations) = max_iterations {
        config.max_iterations = max_iterations;
    }
    if in_context_history {
        config.history.use_in_context_history = true;
    }
    if llm_summary {
        config.history.use_llm_summary = true;
    }
}
