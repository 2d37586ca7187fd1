use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for rechisel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Maximum repair iterations per session
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Number of parallel campaign workers (1-256)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// What a worker does when a session ends on a fault
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Model identifiers per role
    #[serde(default)]
    pub models: ModelsConfig,

    /// Attempt history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Prompt template locations
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Workspace allocation
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// External toolchain commands
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Provider retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Completion provider endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Benchmark locations
    #[serde(default)]
    pub benchmarks: BenchmarksConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_iterations() -> usize {
    10
}

const fn default_workers() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            workers: default_workers(),
            on_error: ErrorPolicy::default(),
            models: ModelsConfig::default(),
            history: HistoryConfig::default(),
            prompts: PromptsConfig::default(),
            workspace: WorkspaceConfig::default(),
            toolchain: ToolchainConfig::default(),
            retry: RetryConfig::default(),
            providers: ProvidersConfig::default(),
            benchmarks: BenchmarksConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Campaign policy on a worker fault
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole campaign
    #[default]
    Raise,
    /// Record the task as failed and continue
    Skip,
}

impl ErrorPolicy {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "raise" => Some(Self::Raise),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Model identifiers per role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelsConfig {
    #[serde(default = "default_model")]
    pub init_gen: String,

    #[serde(default = "default_model")]
    pub reviewer: String,

    #[serde(default = "default_model")]
    pub correction: String,

    #[serde(default = "default_model")]
    pub summary: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl ModelsConfig {
    /// Use one model for every role.
    pub fn uniform(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            init_gen: model.clone(),
            reviewer: model.clone(),
            correction: model.clone(),
            summary: model,
        }
    }

    pub fn all(&self) -> [&str; 4] {
        [&self.init_gen, &self.reviewer, &self.correction, &self.summary]
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self::uniform(default_model())
    }
}

/// Attempt history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryConfig {
    /// Feed recent attempts back into correction prompts
    #[serde(default)]
    pub use_in_context_history: bool,

    /// Number of attempts kept in the prompt window
    #[serde(default = "default_history_window")]
    pub window: usize,

    /// Condense each attempt with a separate completion
    #[serde(default)]
    pub use_llm_summary: bool,
}

const fn default_history_window() -> usize {
    4
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            use_in_context_history: false,
            window: default_history_window(),
            use_llm_summary: false,
        }
    }
}

/// Prompt template locations, relative to `dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PromptsConfig {
    #[serde(default = "default_prompt_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_init_gen_prompt")]
    pub init_gen: String,

    #[serde(default = "default_sbt_reflection_prompt")]
    pub sbt_reflection: String,

    #[serde(default = "default_iv_reflection_prompt")]
    pub iv_reflection: String,

    #[serde(default = "default_syntax_correction_prompt")]
    pub syntax_correction: String,

    #[serde(default = "default_functionality_reflection_prompt")]
    pub functionality_reflection: String,

    #[serde(default = "default_functionality_correction_prompt")]
    pub functionality_correction: String,

    #[serde(default = "default_attempt_summary_prompt")]
    pub attempt_summary: String,
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from("prompts")
}

fn default_init_gen_prompt() -> String {
    "chisel_generation.txt".to_string()
}

fn default_sbt_reflection_prompt() -> String {
    "syntax_sbt_reflection.txt".to_string()
}

fn default_iv_reflection_prompt() -> String {
    "syntax_iv_reflection.txt".to_string()
}

fn default_syntax_correction_prompt() -> String {
    "syntax_correction.txt".to_string()
}

fn default_functionality_reflection_prompt() -> String {
    "functionality_reflection.txt".to_string()
}

fn default_functionality_correction_prompt() -> String {
    "functionality_correction.txt".to_string()
}

fn default_attempt_summary_prompt() -> String {
    "attempt_summary.txt".to_string()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: default_prompt_dir(),
            init_gen: default_init_gen_prompt(),
            sbt_reflection: default_sbt_reflection_prompt(),
            iv_reflection: default_iv_reflection_prompt(),
            syntax_correction: default_syntax_correction_prompt(),
            functionality_reflection: default_functionality_reflection_prompt(),
            functionality_correction: default_functionality_correction_prompt(),
            attempt_summary: default_attempt_summary_prompt(),
        }
    }
}

/// Workspace allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// Directory under which per-session workspaces are created
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,

    /// Project template copied into every new workspace
    #[serde(default = "default_workspace_template")]
    pub template: PathBuf,

    /// Remove workspace directories on release
    #[serde(default = "default_true")]
    pub cleanup: bool,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("working_space")
}

fn default_workspace_template() -> PathBuf {
    PathBuf::from("working_space/chisel_project_template")
}

const fn default_true() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
            template: default_workspace_template(),
            cleanup: true,
        }
    }
}

/// A program plus its leading arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// External toolchain commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolchainConfig {
    /// Structural compiler, run in the workspace root
    #[serde(default = "default_structural_command")]
    pub structural: CommandConfig,

    /// Low-level compiler; description files are appended as arguments
    #[serde(default = "default_lowlevel_command")]
    pub lowlevel: CommandConfig,

    /// Simulator, run in the low-level region
    #[serde(default = "default_execute_command")]
    pub execute: CommandConfig,

    /// Per-invocation timeout in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_structural_command() -> CommandConfig {
    CommandConfig::new("sbt", &["run"])
}

fn default_lowlevel_command() -> CommandConfig {
    CommandConfig::new("iverilog", &["-g2012", "-o", "a.out"])
}

fn default_execute_command() -> CommandConfig {
    CommandConfig::new("vvp", &["a.out"])
}

const fn default_tool_timeout_secs() -> u64 {
    25
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            structural: default_structural_command(),
            lowlevel: default_lowlevel_command(),
            execute: default_execute_command(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum attempts per provider call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed wait between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    16
}

const fn default_backoff_ms() -> u64 {
    200
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Completion provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvidersConfig {
    /// OpenAI-compatible base URL; falls back to `OPENAI_API_ENDPOINT`
    #[serde(default)]
    pub openai_base_url: Option<String>,

    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,

    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_base_url: None,
            anthropic_base_url: default_anthropic_base_url(),
            anthropic_version: default_anthropic_version(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Benchmark locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchmarksConfig {
    #[serde(default = "default_verilog_eval_dir")]
    pub verilog_eval_dir: PathBuf,

    /// Problem list file inside `verilog_eval_dir`
    #[serde(default = "default_verilog_eval_problem_list")]
    pub verilog_eval_problem_list: String,

    #[serde(default = "default_autochip_prompt_dir")]
    pub autochip_prompt_dir: PathBuf,

    #[serde(default = "default_autochip_reference_dir")]
    pub autochip_reference_dir: PathBuf,

    /// Problem ids (or `*` patterns) to leave out of AutoChip campaigns
    #[serde(default = "default_autochip_exclusion_file")]
    pub autochip_exclusion_file: PathBuf,
}

fn default_verilog_eval_dir() -> PathBuf {
    PathBuf::from("benchmarks/dataset_spec-to-rtl")
}

fn default_verilog_eval_problem_list() -> String {
    "problems.txt".to_string()
}

fn default_autochip_prompt_dir() -> PathBuf {
    PathBuf::from("benchmarks/autochip_prompt")
}

fn default_autochip_reference_dir() -> PathBuf {
    PathBuf::from("benchmarks/autochip_ref")
}

fn default_autochip_exclusion_file() -> PathBuf {
    PathBuf::from("autochip_exclusive.txt")
}

impl Default for BenchmarksConfig {
    fn default() -> Self {
        Self {
            verilog_eval_dir: default_verilog_eval_dir(),
            verilog_eval_problem_list: default_verilog_eval_problem_list(),
            autochip_prompt_dir: default_autochip_prompt_dir(),
            autochip_reference_dir: default_autochip_reference_dir(),
            autochip_exclusion_file: default_autochip_exclusion_file(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
            retention_days: default_retention_days(),
        }
    }
}
