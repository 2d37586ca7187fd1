//! CLI type definitions
//!
//! Top-level clap structures; each subcommand's arguments live next to its
//! implementation in [`crate::cli::commands`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{eval::EvalArgs, run::RunArgs, solve::SolveArgs};

#[derive(Parser, Debug)]
#[command(name = "rechisel")]
#[command(
    about = "Generate, verify and repair Chisel designs with language models",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .rechisel/config.yaml)
    #[arg(short, long, global = true, env = "RECHISEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a campaign over a benchmark
    Run(RunArgs),

    /// Solve a single specification
    Solve(SolveArgs),

    /// Summarize result records
    Eval(EvalArgs),
}
