pub mod campaign;
pub mod evaluation;
pub mod repair_loop;

pub use campaign::{
    CampaignConfig, CampaignOrchestrator, CampaignSummary, PassSummary, ProgressFactory,
};
pub use evaluation::{evaluate_dir, pass_at_k, pass_dirs, EvalStats, PassAtK};
pub use repair_loop::{LoopState, RepairLoop, RepairLoopConfig, Session};
