//! Core data types for the trade-journal ingestion engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of accepted trades shown to the user before committing an import.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Label used wherever a market could not be determined.
pub const UNKNOWN_MARKET_LABEL: &str = "Unknown";

/// Market type of a trade.
///
/// The declaration order is the registry order: classification ties are
/// resolved in favour of the earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    Futures,
    Options,
    Forex,
    Crypto,
    Stocks,
}

impl MarketType {
    /// All markets in registry order.
    pub const ALL: [MarketType; 5] = [
        MarketType::Futures,
        MarketType::Options,
        MarketType::Forex,
        MarketType::Crypto,
        MarketType::Stocks,
    ];

    /// Stable identifier (`"FUTURES"`, `"STOCKS"`, ...).
    pub fn id(self) -> &'static str {
        match self {
            MarketType::Futures => "FUTURES",
            MarketType::Options => "OPTIONS",
            MarketType::Forex => "FOREX",
            MarketType::Crypto => "CRYPTO",
            MarketType::Stocks => "STOCKS",
        }
    }

    /// Parse an identifier case-insensitively. Accepts a few common aliases.
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "futures" | "future" => Some(MarketType::Futures),
            "options" | "option" => Some(MarketType::Options),
            "forex" | "fx" => Some(MarketType::Forex),
            "crypto" | "cryptocurrency" => Some(MarketType::Crypto),
            "stocks" | "stock" | "equities" | "equity" => Some(MarketType::Stocks),
            _ => None,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketType::Futures => "Futures",
            MarketType::Options => "Options",
            MarketType::Forex => "Forex",
            MarketType::Crypto => "Crypto",
            MarketType::Stocks => "Stocks",
        };
        f.write_str(name)
    }
}

/// Display label for an optional market, `"Unknown"` when absent.
pub fn market_label(market: Option<MarketType>) -> String {
    market
        .map(|m| m.to_string())
        .unwrap_or_else(|| UNKNOWN_MARKET_LABEL.to_string())
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get direction: +1 for buy, -1 for sell.
    #[inline]
    pub fn direction(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// A logical trade field that an input column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    Symbol,
    Side,
    EntryPrice,
    ExitPrice,
    Quantity,
    EntryDate,
    ExitDate,
    Pnl,
    Notes,
}

impl LogicalField {
    /// Resolution order used by the column mapper.
    ///
    /// Fields with more specific vocabularies come first so that, e.g., an
    /// "Exit Date" header is claimed before the generic date vocabulary sees it.
    pub const RESOLUTION_ORDER: [LogicalField; 9] = [
        LogicalField::Symbol,
        LogicalField::Quantity,
        LogicalField::EntryPrice,
        LogicalField::ExitPrice,
        LogicalField::ExitDate,
        LogicalField::EntryDate,
        LogicalField::Pnl,
        LogicalField::Side,
        LogicalField::Notes,
    ];

    /// Fields a complete export is expected to carry.
    pub const REQUIRED: [LogicalField; 3] = [
        LogicalField::Symbol,
        LogicalField::EntryPrice,
        LogicalField::Quantity,
    ];

    /// Fields holding numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            LogicalField::EntryPrice
                | LogicalField::ExitPrice
                | LogicalField::Quantity
                | LogicalField::Pnl
        )
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            LogicalField::Symbol => "symbol",
            LogicalField::Side => "side",
            LogicalField::EntryPrice => "entry price",
            LogicalField::ExitPrice => "exit price",
            LogicalField::Quantity => "quantity",
            LogicalField::EntryDate => "date",
            LogicalField::ExitDate => "exit date",
            LogicalField::Pnl => "P&L",
            LogicalField::Notes => "notes",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One data line of an import, cells in header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based line number in the source text.
    pub line: usize,
    /// Cell values, already trimmed and quote-stripped.
    pub values: Vec<String>,
}

impl RawRow {
    pub fn new(line: usize, values: Vec<String>) -> Self {
        Self { line, values }
    }

    /// Cell at a header index, `None` when the row is shorter than the header.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

/// A header bound to a logical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedColumn {
    /// Position of the header in the header line.
    pub index: usize,
    /// Header text as it appeared in the input.
    pub header: String,
}

/// Resolved correspondence between input headers and logical fields.
///
/// At most one header per field and one field per header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: BTreeMap<LogicalField, MappedColumn>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a header to a field. Returns `false` if either side is already bound.
    pub fn bind(&mut self, field: LogicalField, index: usize, header: impl Into<String>) -> bool {
        if self.columns.contains_key(&field) || self.is_index_bound(index) {
            return false;
        }
        self.columns.insert(
            field,
            MappedColumn {
                index,
                header: header.into(),
            },
        );
        true
    }

    pub fn get(&self, field: LogicalField) -> Option<&MappedColumn> {
        self.columns.get(&field)
    }

    /// Header index bound to a field.
    pub fn index_of(&self, field: LogicalField) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }

    pub fn contains(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    /// Whether some field consumed the header at `index`.
    pub fn is_index_bound(&self, index: usize) -> bool {
        self.columns.values().any(|c| c.index == index)
    }

    /// Iterate over bound fields in field order.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, &MappedColumn)> {
        self.columns.iter().map(|(f, c)| (*f, c))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Required fields that could not be resolved.
    pub fn missing_required(&self) -> Vec<LogicalField> {
        LogicalField::REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }

    /// Minimum viable schema: a symbol plus either an entry price or a direct P&L column.
    pub fn is_viable(&self) -> bool {
        self.contains(LogicalField::Symbol)
            && (self.contains(LogicalField::EntryPrice) || self.contains(LogicalField::Pnl))
    }
}

/// The normalized trade record produced by the ingestion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    /// Trimmed, uppercase symbol. Never empty.
    pub symbol: String,
    pub side: Side,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    /// Absolute position size.
    pub quantity: f64,
    /// Market the batch was classified as, `None` for unknown.
    pub market: Option<MarketType>,
    /// Entry time.
    pub timestamp: DateTime<Utc>,
    pub exit_timestamp: Option<DateTime<Utc>>,
    /// Computed P&L. `None` unless both prices are present.
    pub pnl: Option<f64>,
    /// P&L as reported by the export, when it has a P&L column.
    pub reported_pnl: Option<f64>,
    /// Notes plus every unmapped column as `Header: value`.
    pub annotation: Option<String>,
    /// 1-based line number in the source text.
    pub source_line: usize,
}

impl TradeCandidate {
    /// Computed P&L if available, otherwise the P&L reported by the export.
    pub fn effective_pnl(&self) -> Option<f64> {
        self.pnl.or(self.reported_pnl)
    }
}

/// How the batch market type was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSource {
    /// Scored from the header line.
    Headers,
    /// Voted from sampled symbols.
    Sample,
    /// Could not be determined.
    Unknown,
}

/// Category of a batch-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The text has no header line or no data line.
    Structural,
    /// The headers do not cover the minimum viable fields.
    InsufficientSchema,
}

/// Structured description of an aborted import, suitable for showing to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Logical fields that could not be resolved.
    pub missing_fields: Vec<LogicalField>,
    /// Detected market label, `"Unknown"` when none.
    pub detected_market: String,
    /// Typical columns of the detected market, to help fix the file.
    pub hint: Vec<String>,
}

/// Result of one import call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub accepted: Vec<TradeCandidate>,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub detected_market: Option<MarketType>,
    pub market_source: MarketSource,
    pub mapping: Option<ColumnMapping>,
    /// Data lines considered (after the row cap).
    pub total_rows: usize,
    pub warnings: Vec<String>,
    pub error: Option<ImportFailure>,
}

impl ImportReport {
    /// An empty report for an aborted batch.
    pub fn failed(
        failure: ImportFailure,
        detected_market: Option<MarketType>,
        market_source: MarketSource,
    ) -> Self {
        Self {
            accepted: Vec::new(),
            skipped_count: 0,
            failed_count: 0,
            detected_market,
            market_source,
            mapping: None,
            total_rows: 0,
            warnings: Vec::new(),
            error: Some(failure),
        }
    }

    /// Whether the batch was processed (individual rows may still be skipped).
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// First accepted trades, for confirmation before commit.
    pub fn preview(&self) -> &[TradeCandidate] {
        self.preview_n(DEFAULT_PREVIEW_ROWS)
    }

    pub fn preview_n(&self, n: usize) -> &[TradeCandidate] {
        &self.accepted[..self.accepted.len().min(n)]
    }

    /// Hand over the full accepted list.
    pub fn commit(self) -> Vec<TradeCandidate> {
        self.accepted
    }

    /// Sum of effective P&L over accepted trades that have one.
    pub fn total_pnl(&self) -> f64 {
        self.accepted.iter().filter_map(|t| t.effective_pnl()).sum()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
