//! `rechisel run`: a campaign over a benchmark.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::benchmarks;
use crate::application::{CampaignConfig, CampaignOrchestrator, CampaignSummary};
use crate::cli::output::{create_progress_bar, output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ErrorPolicy};
use crate::infrastructure::ConfigLoader;
use crate::services::WorkspaceManager;

use super::{apply_overrides, build_repair_loop};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Benchmark to run (verilog-eval, autochip)
    #[arg(short, long, default_value = "verilog-eval")]
    pub benchmark: String,

    /// Output directory; records land in `<output>/pass_{n}/`
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Policy on a task fault (raise, skip)
    #[arg(long)]
    pub on_error: Option<String>,

    /// Maximum repair iterations per problem
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Model used for every role
    #[arg(short, long)]
    pub model: Option<String>,

    /// Zero-based index of the first pass
    #[arg(long, default_value = "0")]
    pub pass_begin: usize,

    /// Number of passes (for pass@k)
    #[arg(long, default_value = "1")]
    pub pass_count: usize,

    /// Feed recent attempts into correction prompts
    #[arg(long)]
    pub in_context_history: bool,

    /// Summarize attempts with a separate completion
    #[arg(long)]
    pub llm_summary: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    pub benchmark: String,
    #[serde(flatten)]
    pub summary: CampaignSummary,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!(
            "Campaign on {} finished: {} completed, {} succeeded, {} errored, {} already done\n{}",
            self.benchmark,
            self.summary.completed(),
            self.summary.succeeded(),
            self.summary.errored(),
            self.summary.already_done(),
            TableFormatter::new().format_campaign(&self.summary)
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    apply_overrides(
        &mut config,
        args.model.as_deref(),
        args.max_iterations,
        args.in_context_history,
        args.llm_summary,
    );
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ref policy) = args.on_error {
        config.on_error = ErrorPolicy::from_str(policy)
            .with_context(|| format!("Invalid error policy: {policy}. Must be raise or skip"))?;
    }
    ConfigLoader::validate(&config)?;
    if args.pass_count == 0 {
        anyhow::bail!("--pass-count must be at least 1");
    }

    let benchmark = benchmarks::from_name(&args.benchmark, &config.benchmarks)?;
    let repair_loop = build_repair_loop(&config, benchmark.predicate())?;
    let workspaces = Arc::new(WorkspaceManager::from_config(&config.workspace));

    let campaign_config = CampaignConfig::from_config(&config, &args.output)
        .with_passes(args.pass_begin, args.pass_count);
    let mut orchestrator =
        CampaignOrchestrator::new(campaign_config, repair_loop, Arc::clone(&benchmark), workspaces);
    if !args.no_progress && !json_mode {
        orchestrator = orchestrator.with_progress(Arc::new(create_progress_bar));
    }

    let summary = orchestrator.run().await?;
    output(
        &RunOutput {
            benchmark: benchmark.name().to_string(),
            summary,
        },
        json_mode,
    );
    Ok(())
}
