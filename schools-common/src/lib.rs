//! # Schools Common Library
//!
//! Shared code for the school data pipeline crates:
//! - Error type and `Result` alias
//! - Pipeline configuration (lookup tables, thresholds, sentinels)
//! - TOML configuration loading and resolution

pub mod config;
pub mod error;

pub use config::PipelineConfig;
pub use error::{Error, Result};
