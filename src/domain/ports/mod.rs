//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces adapters must implement:
//! - CompletionProvider: generative text model backends
//! - Verifier: the staged verification pipeline
//! - Benchmark: problem suites and their fixtures

pub mod benchmark;
pub mod completion;
pub mod verifier;

pub use benchmark::Benchmark;
pub use completion::{CompletionProvider, ProviderError, ProviderFactory};
pub use verifier::Verifier;
