//! Configuration structures for the ingestion engine.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main configuration for an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Row handling configuration.
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Market classification configuration.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.ingestion.max_rows == 0 {
            return Err(Error::config("ingestion.max_rows must be at least 1"));
        }
        if self.classifier.sample_size == 0 {
            return Err(Error::config("classifier.sample_size must be at least 1"));
        }
        if self.classifier.keyword_weight == 0 && self.classifier.vocabulary_weight == 0 {
            return Err(Error::config(
                "classifier weights cannot both be zero",
            ));
        }
        Ok(())
    }
}

/// Row handling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Hard cap on data rows per import.
    pub max_rows: usize,
    /// Cell values treated as absent when building annotations (case-insensitive).
    pub meaningless_values: Vec<String>,
    /// Separator between annotation parts.
    pub annotation_separator: String,
    /// Materialize rows on the rayon pool.
    pub parallel: bool,
    /// Minimum batch size before the parallel path is used.
    pub parallel_min_rows: usize,
    /// Timestamp for rows whose date is missing or unparseable.
    /// When unset, the time of the import call is used.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_rows: 1000,
            meaningless_values: ["", "0", "0.0", "0.00", "null", "undefined"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            annotation_separator: " | ".to_string(),
            parallel: false,
            parallel_min_rows: 256,
            reference_time: None,
        }
    }
}

impl IngestionConfig {
    /// Whether a cell carries no information worth keeping.
    pub fn is_meaningless(&self, value: &str) -> bool {
        let value = value.trim();
        self.meaningless_values
            .iter()
            .any(|m| m.eq_ignore_ascii_case(value))
    }
}

/// Market classification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Score per identifier keyword found in the headers.
    pub keyword_weight: u32,
    /// Score per typical column term found in the headers.
    pub vocabulary_weight: u32,
    /// Rows sampled for symbol voting.
    pub sample_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 5,
            vocabulary_weight: 2,
            sample_size: 10,
        }
    }
}
