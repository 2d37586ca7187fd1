//! `rechisel eval`: statistics over result directories.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::application::{evaluate_dir, pass_at_k, pass_dirs, EvalStats, PassAtK};
use crate::cli::output::{output, CommandOutput, TableFormatter};

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Pass directories, or a campaign output directory holding `pass_{n}/`
    #[arg(required = true)]
    pub dirs: Vec<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct DirStats {
    pub dir: PathBuf,
    #[serde(flatten)]
    pub stats: EvalStats,
    pub success_rate: f64,
}

#[derive(Debug, serde::Serialize)]
pub struct EvalOutput {
    pub results: Vec<DirStats>,
    pub pass_at_k: Option<PassAtK>,
}

impl CommandOutput for EvalOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let rows: Vec<(PathBuf, EvalStats)> = self
            .results
            .iter()
            .map(|r| (r.dir.clone(), r.stats.clone()))
            .collect();

        let mut text = formatter.format_eval(&rows);
        if let Some(ref pass_at_k) = self.pass_at_k {
            text.push('\n');
            text.push_str(&formatter.format_pass_at_k(pass_at_k));
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Expand a campaign output directory into its pass directories.
fn resolve_dirs(dirs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();
    for dir in dirs {
        let passes = pass_dirs(&dir)?;
        if passes.is_empty() {
            resolved.push(dir);
        } else {
            resolved.extend(passes);
        }
    }
    Ok(resolved)
}

pub async fn execute(args: EvalArgs, json_mode: bool) -> Result<()> {
    let dirs = resolve_dirs(args.dirs)?;

    let mut results = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let stats = evaluate_dir(dir)?;
        results.push(DirStats {
            dir: dir.clone(),
            success_rate: stats.success_rate(),
            stats,
        });
    }
    let pass_at_k = if dirs.len() > 1 {
        Some(pass_at_k(&dirs)?)
    } else {
        None
    };

    output(&EvalOutput { results, pass_at_k }, json_mode);
    Ok(())
}
