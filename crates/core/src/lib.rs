//! Core types and configuration for the trade-journal ingestion engine.
//!
//! This crate provides shared types used across all other crates:
//! - Market, side and logical-field enums
//! - The normalized trade record and import report
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
