//! ReChisel - verification-guided generation and repair of Chisel designs
//!
//! A language model writes a hardware design from a natural-language
//! specification; the design is compiled, lowered, simulated and checked
//! against a testbench, and every failure is fed back to the model as a
//! targeted repair request until the design passes or the iteration budget
//! runs out.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and domain errors
//! - **Service Layer** (`services`): stage runner, classifier, history,
//!   prompts and the repair agent
//! - **Adapter Layer** (`adapters`): completion providers and benchmarks
//! - **Application Layer** (`application`): repair loop, campaigns and
//!   evaluation
//! - **Infrastructure Layer** (`infrastructure`): config, logging, retry and
//!   process execution
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use rechisel::application::{RepairLoop, RepairLoopConfig};
//!
//! let session = repair_loop.run(&problem, &workspace).await?;
//! println!("{}", session.record().outcome.as_str());
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    CampaignConfig, CampaignOrchestrator, CampaignSummary, LoopState, RepairLoop, RepairLoopConfig,
    Session,
};
pub use domain::models::{
    CandidateArtifact, Config, FailureClass, FunctionalPredicate, Problem, RepairStrategy,
    SessionOutcome, TaskRecord, VerificationResult, Workspace,
};
pub use domain::ports::{Benchmark, CompletionProvider, ProviderFactory, Verifier};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{StageRunner, WorkspaceManager};
