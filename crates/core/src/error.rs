//! Error types for the trade-journal ingestion engine.

use crate::types::{market_label, FailureKind, ImportFailure, LogicalField, MarketType};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ingestion engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The input has no header line or no data line.
    #[error("Structural error: {0}")]
    Structural(String),

    /// The headers do not cover the minimum viable set of fields.
    #[error("Insufficient schema: could not resolve {}", join_fields(.missing))]
    InsufficientSchema {
        missing: Vec<LogicalField>,
        market: Option<MarketType>,
        hint: Vec<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_fields(fields: &[LogicalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a structural error.
    pub fn structural(msg: impl Into<String>) -> Self {
        Error::Structural(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a schema error for the given unresolved fields.
    pub fn insufficient_schema(
        missing: Vec<LogicalField>,
        market: Option<MarketType>,
        hint: Vec<String>,
    ) -> Self {
        Error::InsufficientSchema {
            missing,
            market,
            hint,
        }
    }

    /// Convert a batch-level error into the structured failure attached to a report.
    pub fn to_failure(&self) -> ImportFailure {
        match self {
            Error::InsufficientSchema {
                missing,
                market,
                hint,
            } => ImportFailure {
                kind: FailureKind::InsufficientSchema,
                message: self.to_string(),
                missing_fields: missing.clone(),
                detected_market: market_label(*market),
                hint: hint.clone(),
            },
            other => ImportFailure {
                kind: FailureKind::Structural,
                message: other.to_string(),
                missing_fields: Vec::new(),
                detected_market: market_label(None),
                hint: Vec::new(),
            },
        }
    }
}

impl From<&Error> for ImportFailure {
    fn from(err: &Error) -> Self {
        err.to_failure()
    }
}
