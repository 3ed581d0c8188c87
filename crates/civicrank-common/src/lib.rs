//! civicrank-common — Shared configuration and error types used across all civicrank crates.

pub mod config;
pub mod error;

pub use config::{Config, PipelineConfig, ZeroAssignedPolicy};
pub use error::{ApiError, PipelineError, Result};
