pub mod artifact;
pub mod attempt;
pub mod config;
pub mod failure;
pub mod message;
pub mod problem;
pub mod record;
pub mod verification;
pub mod workspace;

pub use artifact::CandidateArtifact;
pub use attempt::Attempt;
pub use config::{
    BenchmarksConfig, CommandConfig, Config, ErrorPolicy, HistoryConfig, LoggingConfig,
    ModelsConfig, PromptsConfig, ProvidersConfig, RetryConfig, ToolchainConfig, WorkspaceConfig,
};
pub use failure::{FailureClass, RepairStrategy};
pub use message::{ChatMessage, Completion, Role, TokenUsage};
pub use problem::{Fixture, FunctionalPredicate, Problem};
pub use record::{RepairTry, SessionOutcome, TaskRecord, TryKind};
pub use verification::{Stage, VerificationResult, VerificationResultBuilder};
pub use workspace::Workspace;
