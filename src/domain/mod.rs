//! Domain layer for the repair loop
//!
//! This module contains the core models, the port traits adapters implement,
//! and the domain error type.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult};
