pub mod classifier;
pub mod history;
pub mod prompts;
pub mod repair_agent;
pub mod stages;
pub mod workspace_manager;

pub use classifier::{classify, route};
pub use history::{format_in_context, History};
pub use prompts::{build_feedback, PromptSet};
pub use repair_agent::RepairAgent;
pub use stages::{
    ExecutionStage, LowLevelCompileStage, StageOutcome, StageRunner, StructuralCompileStage,
};
pub use workspace_manager::WorkspaceManager;
