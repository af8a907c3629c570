//! Import pipeline.
//!
//! Text -> rows -> market detection -> column mapping -> materialization ->
//! report. Batch-level problems abort with a structured failure on the report;
//! row-level problems are counted and processing continues.

use crate::column_mapper::map_columns;
use crate::csv_text::{parse_text, ParsedText};
use crate::materializer::{Materialized, RowMaterializer, RowRejection};
use chrono::{DateTime, Utc};
use journal_core::{
    market_label, ColumnMapping, Config, Error, ImportReport, LogicalField, MarketSource,
    MarketType, Result,
};
use journal_markets::{definition, MarketClassifier};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Orchestrates one import call per text blob.
#[derive(Debug, Clone, Default)]
pub struct TradeImporter {
    config: Config,
    classifier: MarketClassifier,
}

/// Tally of row outcomes.
#[derive(Debug, Default)]
struct RowTally {
    accepted: Vec<Materialized>,
    skipped: usize,
    failed: usize,
    first_failure: Option<(usize, RowRejection)>,
}

impl TradeImporter {
    pub fn new(config: Config) -> Self {
        let classifier = MarketClassifier::new(config.classifier.clone());
        Self { config, classifier }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &MarketClassifier {
        &self.classifier
    }

    /// Import a text blob. Never fails: batch-level errors end up in
    /// [`ImportReport::error`] with an empty accepted list.
    pub fn import(&self, text: &str) -> ImportReport {
        let parsed = match parse_text(text, self.config.ingestion.max_rows) {
            Ok(parsed) => parsed,
            Err(err) => return self.abort(&err, None, MarketSource::Unknown),
        };
        let (market, source) = self.detect_market(&parsed);
        match self.process(parsed, market, source) {
            Ok(report) => report,
            Err(err) => self.abort(&err, market, source),
        }
    }

    /// Import a text blob, returning batch-level errors as `Err`.
    pub fn try_import(&self, text: &str) -> Result<ImportReport> {
        let parsed = parse_text(text, self.config.ingestion.max_rows)?;
        let (market, source) = self.detect_market(&parsed);
        self.process(parsed, market, source)
    }

    fn abort(&self, err: &Error, market: Option<MarketType>, source: MarketSource) -> ImportReport {
        warn!(error = %err, market = %market_label(market), "import aborted");
        ImportReport::failed(err.to_failure(), market, source)
    }

    /// Headers first, then a symbol vote over the sampled rows.
    fn detect_market(&self, parsed: &ParsedText) -> (Option<MarketType>, MarketSource) {
        if let Some(market) = self.classifier.classify_from_headers(&parsed.headers) {
            return (Some(market), MarketSource::Headers);
        }

        let symbol_index = map_columns(&parsed.headers, None).index_of(LogicalField::Symbol);
        if let Some(index) = symbol_index {
            let sample_size = self.classifier.sample_size();
            let sampled = self
                .classifier
                .classify_from_sample(&parsed.rows, index, sample_size);
            if let Some(market) = sampled {
                return (Some(market), MarketSource::Sample);
            }
        }

        (None, MarketSource::Unknown)
    }

    fn process(
        &self,
        parsed: ParsedText,
        market: Option<MarketType>,
        source: MarketSource,
    ) -> Result<ImportReport> {
        let mut warnings = Vec::new();
        if market.is_none() {
            warnings.push(
                "Market type could not be detected; P&L is computed without a multiplier"
                    .to_string(),
            );
        }

        let mapping = map_columns(&parsed.headers, market);
        let missing = mapping.missing_required();
        if !mapping.is_viable() {
            let hint = market
                .map(|m| definition(m).column_hint())
                .unwrap_or_default();
            return Err(Error::insufficient_schema(missing, market, hint));
        }
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            warnings.push(format!("Columns not found: {}", labels.join(", ")));
        }
        if !mapping.contains(LogicalField::Side) {
            warnings.push(
                "No side column; direction is inferred from the quantity sign".to_string(),
            );
        }
        if !mapping.contains(LogicalField::EntryDate) {
            warnings.push("No date column; the import time is used as the trade date".to_string());
        }
        if parsed.truncated > 0 {
            warnings.push(format!(
                "{} rows beyond the limit of {} were ignored",
                parsed.truncated, self.config.ingestion.max_rows
            ));
        }

        let fallback_time = self.fallback_time();
        let tally = self.materialize_rows(&parsed, &mapping, market, fallback_time);

        let date_defaulted = tally.accepted.iter().filter(|m| m.notes.date_defaulted).count();
        let unknown_side = tally.accepted.iter().filter(|m| m.notes.unknown_side).count();
        let unreadable = tally
            .accepted
            .iter()
            .filter(|m| m.notes.unreadable_cells > 0)
            .count();
        if date_defaulted > 0 && mapping.contains(LogicalField::EntryDate) {
            warnings.push(format!("{date_defaulted} rows had a missing or unreadable date"));
        }
        if unknown_side > 0 {
            warnings.push(format!(
                "{unknown_side} rows had an unrecognized side and were treated as buys"
            ));
        }
        if unreadable > 0 {
            warnings.push(format!(
                "{unreadable} rows had non-numeric price, quantity or P&L cells that were left empty"
            ));
        }
        if let Some((line, rejection)) = &tally.first_failure {
            warnings.push(format!(
                "{} rows failed to parse (first at line {line}: {rejection})",
                tally.failed
            ));
        }

        let report = ImportReport {
            accepted: tally.accepted.into_iter().map(|m| m.trade).collect(),
            skipped_count: tally.skipped + parsed.short_lines,
            failed_count: tally.failed,
            detected_market: market,
            market_source: source,
            mapping: Some(mapping),
            total_rows: parsed.rows.len() + parsed.short_lines,
            warnings,
            error: None,
        };
        info!(
            market = %market_label(market),
            source = ?source,
            accepted = report.accepted.len(),
            skipped = report.skipped_count,
            failed = report.failed_count,
            "import finished"
        );
        Ok(report)
    }

    fn fallback_time(&self) -> DateTime<Utc> {
        self.config.ingestion.reference_time.unwrap_or_else(Utc::now)
    }

    fn materialize_rows(
        &self,
        parsed: &ParsedText,
        mapping: &ColumnMapping,
        market: Option<MarketType>,
        fallback_time: DateTime<Utc>,
    ) -> RowTally {
        let materializer = RowMaterializer::new(
            &parsed.headers,
            mapping,
            market,
            &self.config.ingestion,
            fallback_time,
        );

        let ingestion = &self.config.ingestion;
        let outcomes: Vec<(usize, std::result::Result<Materialized, RowRejection>)> =
            if ingestion.parallel && parsed.rows.len() >= ingestion.parallel_min_rows {
                debug!(rows = parsed.rows.len(), "materializing rows in parallel");
                parsed
                    .rows
                    .par_iter()
                    .map(|row| (row.line, materializer.materialize(row)))
                    .collect()
            } else {
                parsed
                    .rows
                    .iter()
                    .map(|row| (row.line, materializer.materialize(row)))
                    .collect()
            };

        let mut tally = RowTally::default();
        for (line, outcome) in outcomes {
            match outcome {
                Ok(materialized) => tally.accepted.push(materialized),
                Err(rejection) if rejection.is_failure() => {
                    debug!(line, %rejection, "row failed");
                    tally.failed += 1;
                    if tally.first_failure.is_none() {
                        tally.first_failure = Some((line, rejection));
                    }
                }
                Err(rejection) => {
                    debug!(line, %rejection, "row skipped");
                    tally.skipped += 1;
                }
            }
        }
        tally
    }
}
