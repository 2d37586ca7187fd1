//! Infrastructure adapters for external systems.

pub mod benchmarks;
pub mod providers;
