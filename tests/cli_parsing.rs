//! Command-line parsing.

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use rechisel::cli::{Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    temp_env::with_var_unset("RECHISEL_CONFIG", || {
        Cli::try_parse_from(std::iter::once("rechisel").chain(args.iter().copied()))
            .expect("arguments should parse")
    })
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn run_defaults() {
    let cli = parse(&["run", "--output", "results"]);
    assert!(!cli.json);
    assert!(cli.config.is_none());

    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.benchmark, "verilog-eval");
    assert_eq!(args.output, PathBuf::from("results"));
    assert_eq!(args.pass_begin, 0);
    assert_eq!(args.pass_count, 1);
    assert!(args.workers.is_none());
    assert!(args.on_error.is_none());
    assert!(!args.in_context_history);
    assert!(!args.llm_summary);
}

#[test]
fn run_overrides_and_global_flags() {
    let cli = parse(&[
        "run",
        "-b",
        "rtllm",
        "-o",
        "out",
        "-w",
        "8",
        "--on-error",
        "skip",
        "--max-iterations",
        "5",
        "-m",
        "claude-3-5-sonnet-latest",
        "--pass-begin",
        "2",
        "--pass-count",
        "3",
        "--in-context-history",
        "--llm-summary",
        "--json",
        "--log-level",
        "debug",
    ]);
    assert!(cli.json);
    assert_eq!(cli.log_level.as_deref(), Some("debug"));

    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.benchmark, "rtllm");
    assert_eq!(args.workers, Some(8));
    assert_eq!(args.on_error.as_deref(), Some("skip"));
    assert_eq!(args.max_iterations, Some(5));
    assert_eq!(args.model.as_deref(), Some("claude-3-5-sonnet-latest"));
    assert_eq!(args.pass_begin, 2);
    assert_eq!(args.pass_count, 3);
    assert!(args.in_context_history);
    assert!(args.llm_summary);
}

#[test]
fn run_requires_output() {
    let result = temp_env::with_var_unset("RECHISEL_CONFIG", || {
        Cli::try_parse_from(["rechisel", "run"])
    });
    assert!(result.is_err());
}

#[test]
fn solve_arguments() {
    let cli = parse(&[
        "solve",
        "--spec",
        "spec.txt",
        "--testbench",
        "tb.sv",
        "--reference",
        "ref.sv",
        "--output",
        "record.json",
    ]);
    let Commands::Solve(args) = cli.command else {
        panic!("expected solve");
    };
    assert_eq!(args.spec, PathBuf::from("spec.txt"));
    assert_eq!(args.testbench, PathBuf::from("tb.sv"));
    assert_eq!(args.reference, Some(PathBuf::from("ref.sv")));
    assert_eq!(args.top, "TopModule");
    assert_eq!(args.predicate, "mismatch-count");
}

#[test]
fn eval_takes_many_directories() {
    let cli = parse(&["eval", "out/pass_1", "out/pass_2", "--json"]);
    assert!(cli.json);
    let Commands::Eval(args) = cli.command else {
        panic!("expected eval");
    };
    assert_eq!(
        args.dirs,
        vec![PathBuf::from("out/pass_1"), PathBuf::from("out/pass_2")]
    );
}

#[test]
fn eval_requires_a_directory() {
    let result = temp_env::with_var_unset("RECHISEL_CONFIG", || {
        Cli::try_parse_from(["rechisel", "eval"])
    });
    assert!(result.is_err());
}

#[test]
fn config_path_from_environment() {
    let cli = temp_env::with_var("RECHISEL_CONFIG", Some("/etc/rechisel.yaml"), || {
        Cli::try_parse_from(["rechisel", "eval", "out"]).expect("arguments should parse")
    });
    assert_eq!(cli.config, Some(PathBuf::from("/etc/rechisel.yaml")));
}
