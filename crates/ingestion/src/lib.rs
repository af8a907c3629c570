//! Trade ingestion and normalization for the trade-journal engine.
//!
//! This crate handles:
//! - Splitting comma-separated text into header and data rows
//! - Per-cell normalization (dates, sides, numbers)
//! - Fuzzy column-to-field mapping
//! - Row materialization into trade candidates
//! - The import pipeline producing an import report

pub mod column_mapper;
pub mod csv_text;
pub mod importer;
pub mod materializer;
pub mod normalize;

pub use column_mapper::map_columns;
pub use csv_text::{parse_text, ParsedText};
pub use importer::TradeImporter;
pub use materializer::{Materialized, RowMaterializer, RowNotes, RowRejection, SkipReason};
