//! Infrastructure layer module
//!
//! This module contains the external integrations the services build on:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - External process execution with timeouts
//! - Retry policy for provider calls

pub mod config;
pub mod logging;
pub mod process;
pub mod retry;

pub use config::{ConfigError, ConfigLoader};
pub use retry::RetryPolicy;
