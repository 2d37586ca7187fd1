//! Aggregate statistics over campaign output directories.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::models::{SessionOutcome, TaskRecord};

/// Counts over the records of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvalStats {
    pub total: usize,
    /// Solved by the initial generation
    pub first_try_success: usize,
    pub success: usize,
    pub exhausted: usize,
    pub parse_error: usize,
    pub errored: usize,
    /// Mean repair iterations over successful records
    pub mean_iterations_to_success: Option<f64>,
}

impl EvalStats {
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.success as f64 / self.total as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn first_try_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.first_try_success as f64 / self.total as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[TaskRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        let mut iterations = 0usize;
        for record in records {
            if record.first_try_success() {
                stats.first_try_success += 1;
            }
            match record.outcome {
                SessionOutcome::Success => {
                    stats.success += 1;
                    iterations += record.iterations;
                }
                SessionOutcome::Exhausted => stats.exhausted += 1,
                SessionOutcome::ParseError => stats.parse_error += 1,
                SessionOutcome::Error => stats.errored += 1,
            }
        }
        if stats.success > 0 {
            stats.mean_iterations_to_success = Some(iterations as f64 / stats.success as f64);
        }
        stats
    }
}

/// pass@k over several pass directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassAtK {
    pub k: usize,
    /// Distinct problems seen in any pass
    pub problems: usize,
    /// Problems solved in at least one pass
    pub solved: usize,
}

impl PassAtK {
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self) -> f64 {
        if self.problems == 0 {
            0.0
        } else {
            self.solved as f64 / self.problems as f64
        }
    }
}

/// Read every `*.json` record in `dir`, sorted by problem id.
pub fn load_records(dir: &Path) -> Result<Vec<TaskRecord>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read result directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Malformed record {}", path.display()))
        })
        .collect()
}

pub fn evaluate_dir(dir: &Path) -> Result<EvalStats> {
    Ok(EvalStats::from_records(&load_records(dir)?))
}

/// A problem counts as solved when any of the passes solved it.
pub fn pass_at_k(dirs: &[PathBuf]) -> Result<PassAtK> {
    let mut solved_by_problem: BTreeMap<String, bool> = BTreeMap::new();
    for dir in dirs {
        for record in load_records(dir)? {
            *solved_by_problem.entry(record.prob_id).or_default() |= record.success;
        }
    }
    Ok(PassAtK {
        k: dirs.len(),
        problems: solved_by_problem.len(),
        solved: solved_by_problem.values().filter(|s| **s).count(),
    })
}

/// `pass_{n}` subdirectories of a campaign output directory, in pass order.
pub fn pass_dirs(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(output_dir)
        .with_context(|| format!("Failed to read output directory {}", output_dir.display()))?;

    let passes: BTreeSet<(usize, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let n = path
                .file_name()?
                .to_str()?
                .strip_prefix("pass_")?
                .parse::<usize>()
                .ok()?;
            Some((n, path))
        })
        .collect();
    Ok(passes.into_iter().map(|(_, path)| path).collect())
}
