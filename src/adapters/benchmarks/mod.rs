//! Benchmark suites.

pub mod autochip;
pub mod verilog_eval;

pub use autochip::AutoChipBenchmark;
pub use verilog_eval::VerilogEvalBenchmark;

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::BenchmarksConfig;
use crate::domain::ports::Benchmark;

/// Construct a benchmark by name (`verilog-eval` or `autochip`).
pub fn from_name(name: &str, config: &BenchmarksConfig) -> DomainResult<Arc<dyn Benchmark>> {
    match name {
        "verilog-eval" | "verilogeval" => Ok(Arc::new(VerilogEvalBenchmark::new(
            &config.verilog_eval_dir,
            &config.verilog_eval_problem_list,
        ))),
        "autochip" => Ok(Arc::new(
            AutoChipBenchmark::new(&config.autochip_prompt_dir, &config.autochip_reference_dir)
                .with_exclusion_file(&config.autochip_exclusion_file),
        )),
        other => Err(DomainError::Configuration(format!("Unknown benchmark: {other}"))),
    }
}
