use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(usize),

    #[error("Invalid workers: {0}. Must be between 1 and 256")]
    InvalidWorkers(usize),

    #[error("Invalid history window: {0}. Must be at least 1")]
    InvalidHistoryWindow(usize),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid toolchain timeout: {0}s. Must be at least 1")]
    InvalidToolTimeout(u64),

    #[error("Model identifier for {0} cannot be empty")]
    EmptyModel(&'static str),

    #[error("Toolchain program for {0} cannot be empty")]
    EmptyProgram(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .rechisel/config.yaml (project config)
    /// 3. .rechisel/local.yaml (local overrides, optional)
    /// 4. Environment variables (RECHISEL_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".rechisel/config.yaml"))
            .merge(Yaml::file(".rechisel/local.yaml"))
            .merge(Env::prefixed("RECHISEL_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment
    /// overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("RECHISEL_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(config.max_iterations));
        }

        if config.workers == 0 || config.workers > 256 {
            return Err(ConfigError::InvalidWorkers(config.workers));
        }

        if config.history.window == 0 {
            return Err(ConfigError::InvalidHistoryWindow(config.history.window));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.toolchain.timeout_secs == 0 {
            return Err(ConfigError::InvalidToolTimeout(config.toolchain.timeout_secs));
        }

        let roles = ["init_gen", "reviewer", "correction", "summary"];
        for (role, model) in roles.into_iter().zip(config.models.all()) {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModel(role));
            }
        }

        let tools = [
            ("structural", &config.toolchain.structural.program),
            ("lowlevel", &config.toolchain.lowlevel.program),
            ("execute", &config.toolchain.execute.program),
        ];
        for (stage, program) in tools {
            if program.trim().is_empty() {
                return Err(ConfigError::EmptyProgram(stage));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
