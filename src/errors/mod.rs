//! Centralized error handling for the pipeline engine
//!
//! All engine operations return [`PipelineResult`]. The taxonomy in
//! [`types`] distinguishes recoverable caller errors (duplicate names,
//! protected-stage violations, missing records, malformed input) from
//! storage failure, which is the only condition treated as unrecoverable.

pub mod types;

pub use types::{PipelineError, is_unique_violation};

/// Convenience result type used throughout the engine
pub type PipelineResult<T> = Result<T, PipelineError>;
