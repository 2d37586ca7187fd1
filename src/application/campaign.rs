//! Campaign orchestrator.
//!
//! Runs one repair session per problem across a fixed pool of workers. Each
//! worker acquires a single workspace up front, reuses it for every task it
//! dequeues, and releases it when the queue is drained. The shared queue and
//! the progress counters are the only state workers touch in common.
//!
//! A campaign is made of passes (for pass@k measurement); every pass writes
//! `<output>/pass_{n}/{problem_id}.json` and skips problems whose record
//! already exists, so an interrupted pass can be resumed.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, ErrorPolicy, TaskRecord, Workspace};
use crate::domain::ports::Benchmark;
use crate::services::workspace_manager::WorkspaceManager;

use super::repair_loop::RepairLoop;

/// Builds the progress bar shown for a pass of `len` tasks.
pub type ProgressFactory = Arc<dyn Fn(u64) -> ProgressBar + Send + Sync>;

/// Campaign settings.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub workers: usize,
    pub on_error: ErrorPolicy,
    /// Records land in `output_dir/pass_{n}/`
    pub output_dir: PathBuf,
    /// Zero-based index of the first pass
    pub pass_begin: usize,
    pub pass_count: usize,
    /// Project template copied into each worker's workspace
    pub template: PathBuf,
}

impl CampaignConfig {
    pub fn from_config(config: &Config, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            workers: config.workers,
            on_error: config.on_error,
            output_dir: output_dir.into(),
            pass_begin: 0,
            pass_count: 1,
            template: config.workspace.template.clone(),
        }
    }

    pub fn with_passes(mut self, begin: usize, count: usize) -> Self {
        self.pass_begin = begin;
        self.pass_count = count;
        self
    }

    /// Directory of the pass with zero-based index `index`.
    pub fn pass_dir(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("pass_{}", index + 1))
    }
}

/// Counts for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub pass: usize,
    pub output_dir: PathBuf,
    /// Problems in the benchmark
    pub total: usize,
    /// Problems skipped because their record already existed
    pub already_done: usize,
    /// Problems processed in this run (including recorded errors)
    pub completed: usize,
    pub succeeded: usize,
    /// Problems whose session ended on a fault under `skip`
    pub errored: usize,
}

/// Counts for every pass of a campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    pub passes: Vec<PassSummary>,
}

impl CampaignSummary {
    pub fn completed(&self) -> usize {
        self.passes.iter().map(|p| p.completed).sum()
    }

    pub fn succeeded(&self) -> usize {
        self.passes.iter().map(|p| p.succeeded).sum()
    }

    pub fn errored(&self) -> usize {
        self.passes.iter().map(|p| p.errored).sum()
    }

    pub fn already_done(&self) -> usize {
        self.passes.iter().map(|p| p.already_done).sum()
    }
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    errored: AtomicUsize,
}

pub struct CampaignOrchestrator {
    config: CampaignConfig,
    repair_loop: Arc<RepairLoop>,
    benchmark: Arc<dyn Benchmark>,
    workspaces: Arc<WorkspaceManager>,
    progress: ProgressFactory,
}

impl CampaignOrchestrator {
    pub fn new(
        config: CampaignConfig,
        repair_loop: Arc<RepairLoop>,
        benchmark: Arc<dyn Benchmark>,
        workspaces: Arc<WorkspaceManager>,
    ) -> Self {
        Self {
            config,
            repair_loop,
            benchmark,
            workspaces,
            progress: Arc::new(|_| ProgressBar::hidden()),
        }
    }

    /// Show progress with bars from `factory`.
    pub fn with_progress(mut self, factory: ProgressFactory) -> Self {
        self.progress = factory;
        self
    }

    /// Run every configured pass in order.
    ///
    /// Under `raise`, the first failing task aborts the pass: queued tasks
    /// are abandoned without records and the error is returned.
    pub async fn run(&self) -> Result<CampaignSummary> {
        let mut summary = CampaignSummary::default();
        for index in self.config.pass_begin..self.config.pass_begin + self.config.pass_count {
            let pass = self.run_pass(index).await?;
            summary.passes.push(pass);
        }
        Ok(summary)
    }

    #[instrument(skip(self), fields(benchmark = self.benchmark.name()))]
    async fn run_pass(&self, index: usize) -> Result<PassSummary> {
        let dir = self.config.pass_dir(index);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let ids = self
            .benchmark
            .problem_ids()
            .context("Failed to list benchmark problems")?;
        let total = ids.len();
        let pending: VecDeque<String> = ids
            .into_iter()
            .filter(|id| !record_path(&dir, id).exists())
            .collect();
        let already_done = total - pending.len();

        info!(
            pass = index + 1,
            total,
            already_done,
            pending = pending.len(),
            workers = self.config.workers,
            "Starting pass"
        );

        let mut summary = PassSummary {
            pass: index + 1,
            output_dir: dir.clone(),
            total,
            already_done,
            ..PassSummary::default()
        };
        if pending.is_empty() {
            return Ok(summary);
        }

        let progress = (self.progress)(pending.len() as u64);
        progress.set_message(format!("pass {}", index + 1));

        let worker_count = self.config.workers.clamp(1, pending.len());
        let queue = Arc::new(Mutex::new(pending));
        let counters = Arc::new(Counters::default());
        let abort = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&queue),
                counters: Arc::clone(&counters),
                abort: Arc::clone(&abort),
                repair_loop: Arc::clone(&self.repair_loop),
                benchmark: Arc::clone(&self.benchmark),
                workspaces: Arc::clone(&self.workspaces),
                template: self.config.template.clone(),
                output_dir: dir.clone(),
                on_error: self.config.on_error,
                progress: progress.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        let mut first_error = None;
        for joined in join_all(handles).await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => Err(anyhow::anyhow!("Worker task failed: {join_error}")),
            };
            if let Err(e) = outcome {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        progress.finish();

        summary.completed = counters.completed.load(Ordering::SeqCst);
        summary.succeeded = counters.succeeded.load(Ordering::SeqCst);
        summary.errored = counters.errored.load(Ordering::SeqCst);

        if let Some(e) = first_error {
            error!(pass = index + 1, error = %e, "Pass aborted");
            return Err(e);
        }

        info!(
            pass = index + 1,
            completed = summary.completed,
            succeeded = summary.succeeded,
            errored = summary.errored,
            "Pass finished"
        );
        Ok(summary)
    }
}

fn record_path(dir: &Path, problem_id: &str) -> PathBuf {
    dir.join(format!("{problem_id}.json"))
}

/// Write a record through a temporary file so a resumed pass never sees a
/// partial record.
pub async fn write_record(dir: &Path, record: &TaskRecord) -> Result<PathBuf> {
    let path = record_path(dir, &record.prob_id);
    let tmp = dir.join(format!("{}.json.tmp", record.prob_id));
    let json = serde_json::to_string_pretty(record).context("Failed to serialize record")?;

    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .with_context(|| format!("Failed to move record into {}", path.display()))?;
    Ok(path)
}

struct Worker {
    id: usize,
    queue: Arc<Mutex<VecDeque<String>>>,
    counters: Arc<Counters>,
    abort: Arc<AtomicBool>,
    repair_loop: Arc<RepairLoop>,
    benchmark: Arc<dyn Benchmark>,
    workspaces: Arc<WorkspaceManager>,
    template: PathBuf,
    output_dir: PathBuf,
    on_error: ErrorPolicy,
    progress: ProgressBar,
}

impl Worker {
    async fn run(self) -> Result<()> {
        let workspace = self
            .workspaces
            .acquire(&self.template)
            .await
            .with_context(|| format!("Worker {} could not acquire a workspace", self.id))?;

        let drained = self.drain(&workspace).await;
        let released = self.workspaces.release(workspace).await;

        drained?;
        released.context("Failed to release workspace")?;
        Ok(())
    }

    async fn drain(&self, workspace: &Workspace) -> Result<()> {
        loop {
            if self.abort.load(Ordering::SeqCst) {
                info!(worker_id = self.id, "Pass aborted, worker stopping");
                return Ok(());
            }
            let Some(problem_id) = self.queue.lock().await.pop_front() else {
                return Ok(());
            };

            let record = match self.solve(&problem_id, workspace).await {
                Ok(record) => record,
                Err(e) => match self.on_error {
                    ErrorPolicy::Skip => {
                        warn!(
                            worker_id = self.id,
                            problem_id = %problem_id,
                            error = %e,
                            "Task failed, skipping"
                        );
                        self.counters.errored.fetch_add(1, Ordering::SeqCst);
                        TaskRecord::failed_with_error(&problem_id, e.to_string())
                    }
                    ErrorPolicy::Raise => {
                        self.abort.store(true, Ordering::SeqCst);
                        error!(
                            worker_id = self.id,
                            problem_id = %problem_id,
                            error = %e,
                            "Task failed, aborting pass"
                        );
                        return Err(
                            anyhow::Error::new(e).context(format!("Problem {problem_id} failed"))
                        );
                    }
                },
            };

            if record.success {
                self.counters.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            write_record(&self.output_dir, &record).await?;
            self.counters.completed.fetch_add(1, Ordering::SeqCst);
            self.progress.inc(1);
        }
    }

    async fn solve(&self, problem_id: &str, workspace: &Workspace) -> DomainResult<TaskRecord> {
        let problem = self.benchmark.load(problem_id)?;
        let session = self.repair_loop.run(&problem, workspace).await?;
        Ok(session.into_record())
    }
}
