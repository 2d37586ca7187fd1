//! `rechisel solve`: one session for a single specification.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Fixture, FunctionalPredicate, Problem, TaskRecord, TokenUsage};
use crate::services::WorkspaceManager;

use super::{apply_overrides, build_repair_loop};

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Natural-language specification file
    #[arg(short, long)]
    pub spec: PathBuf,

    /// Reference model copied next to the testbench
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Testbench file
    #[arg(short, long)]
    pub testbench: PathBuf,

    /// Top-level module name
    #[arg(long, default_value = "TopModule")]
    pub top: String,

    /// Success predicate (all-tests-passed, mismatch-count)
    #[arg(short, long, default_value = "mismatch-count")]
    pub predicate: String,

    /// Where to write the result record
    #[arg(short, long)]
    pub output: PathBuf,

    /// Model used for every role
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum repair iterations
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Feed recent attempts into correction prompts
    #[arg(long)]
    pub in_context_history: bool,

    /// Summarize attempts with a separate completion
    #[arg(long)]
    pub llm_summary: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct SolveOutput {
    pub prob_id: String,
    pub success: bool,
    pub outcome: String,
    pub iterations: usize,
    pub record: PathBuf,
    pub usage: TokenUsage,
}

impl CommandOutput for SolveOutput {
    fn to_human(&self) -> String {
        let status = if self.success {
            console::style("solved").green().bold()
        } else {
            console::style(self.outcome.as_str()).red().bold()
        };
        format!(
            "{}: {} after {} repair iteration(s)\nRecord: {}\nTokens: {} in / {} out",
            self.prob_id,
            status,
            self.iterations,
            self.record.display(),
            self.usage.input_tokens,
            self.usage.output_tokens
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn read_fixture(path: &Path) -> Result<Fixture> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid fixture path: {}", path.display()))?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    Ok(Fixture::new(file_name, contents))
}

/// Build the problem from the files named on the command line.
fn load_problem(args: &SolveArgs) -> Result<Problem> {
    let specification = std::fs::read_to_string(&args.spec)
        .with_context(|| format!("Failed to read specification {}", args.spec.display()))?;
    let id = args
        .spec
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("problem")
        .to_string();

    let mut problem = Problem::new(id, specification, &args.top);
    if let Some(ref reference) = args.reference {
        problem = problem.with_fixture(read_fixture(reference)?);
    }
    Ok(problem.with_fixture(read_fixture(&args.testbench)?))
}

async fn write_record(path: &Path, record: &TaskRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub async fn execute(args: SolveArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut config = config.clone();
    apply_overrides(
        &mut config,
        args.model.as_deref(),
        args.max_iterations,
        args.in_context_history,
        args.llm_summary,
    );
    crate::infrastructure::ConfigLoader::validate(&config)?;

    let predicate = FunctionalPredicate::from_str(&args.predicate).with_context(|| {
        format!(
            "Invalid predicate: {}. Must be all-tests-passed or mismatch-count",
            args.predicate
        )
    })?;
    let problem = load_problem(&args)?;
    let repair_loop = build_repair_loop(&config, predicate)?;
    let workspaces = WorkspaceManager::from_config(&config.workspace);

    let workspace = workspaces.acquire(&config.workspace.template).await?;
    let session = repair_loop.run(&problem, &workspace).await;
    workspaces.release(workspace).await?;
    let record = session
        .with_context(|| format!("Session for {} failed", problem.id))?
        .into_record();

    write_record(&args.output, &record).await?;
    output(
        &SolveOutput {
            prob_id: record.prob_id.clone(),
            success: record.success,
            outcome: record.outcome.as_str().to_string(),
            iterations: record.iterations,
            record: args.output.clone(),
            usage: repair_loop.agent().usage(),
        },
        json_mode,
    );
    Ok(())
}
