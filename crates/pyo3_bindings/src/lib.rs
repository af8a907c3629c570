//! PyO3 bindings for the trade-journal ingestion engine.
//!
//! Exposes the Rust implementation to Python:
//! - Text import into normalized trade candidates
//! - Market classification of symbols and header lines
//! - Market-aware P&L
//! - Date and side normalization

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use journal_core::{
    Config as RustConfig, ImportReport as RustImportReport, MarketType, Side as RustSide,
    TradeCandidate as RustTradeCandidate,
};
use journal_ingestion::normalize;
use journal_ingestion::TradeImporter as RustTradeImporter;
use journal_markets::MarketClassifier;
use journal_pnl::{pnl_from_parts, unit_multiplier};

fn parse_market(market: Option<&str>) -> PyResult<Option<MarketType>> {
    match market {
        None => Ok(None),
        Some(id) if id.trim().is_empty() || id.eq_ignore_ascii_case("unknown") => Ok(None),
        Some(id) => MarketType::from_id(id)
            .map(Some)
            .ok_or_else(|| PyValueError::new_err(format!("unknown market type: {id}"))),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// Trade direction.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, PartialEq)]
pub enum TradeSide {
    Buy = 1,
    Sell = -1,
}

#[pymethods]
impl TradeSide {
    #[getter]
    fn sign(&self) -> i8 {
        match self {
            TradeSide::Buy => 1,
            TradeSide::Sell => -1,
        }
    }
}

impl From<RustSide> for TradeSide {
    fn from(s: RustSide) -> Self {
        match s {
            RustSide::Buy => TradeSide::Buy,
            RustSide::Sell => TradeSide::Sell,
        }
    }
}

/// A normalized trade.
#[pyclass]
#[derive(Clone)]
pub struct TradeCandidate {
    #[pyo3(get)]
    pub symbol: String,
    #[pyo3(get)]
    pub side: TradeSide,
    #[pyo3(get)]
    pub entry_price: Option<f64>,
    #[pyo3(get)]
    pub exit_price: Option<f64>,
    #[pyo3(get)]
    pub quantity: f64,
    /// Market identifier (`"FUTURES"`, ...), `None` when unknown.
    #[pyo3(get)]
    pub market: Option<String>,
    /// Entry time in Unix milliseconds.
    #[pyo3(get)]
    pub timestamp_ms: i64,
    #[pyo3(get)]
    pub exit_timestamp_ms: Option<i64>,
    #[pyo3(get)]
    pub pnl: Option<f64>,
    #[pyo3(get)]
    pub reported_pnl: Option<f64>,
    #[pyo3(get)]
    pub annotation: Option<String>,
    #[pyo3(get)]
    pub source_line: usize,
}

#[pymethods]
impl TradeCandidate {
    /// Computed P&L, or the reported one when prices are incomplete.
    #[getter]
    fn effective_pnl(&self) -> Option<f64> {
        self.pnl.or(self.reported_pnl)
    }

    fn __repr__(&self) -> String {
        format!(
            "TradeCandidate(symbol={}, side={}, qty={}, entry={:?}, exit={:?}, pnl={:?})",
            self.symbol,
            if self.side == TradeSide::Buy { "BUY" } else { "SELL" },
            self.quantity,
            self.entry_price,
            self.exit_price,
            self.pnl
        )
    }
}

impl From<RustTradeCandidate> for TradeCandidate {
    fn from(t: RustTradeCandidate) -> Self {
        TradeCandidate {
            symbol: t.symbol,
            side: t.side.into(),
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            quantity: t.quantity,
            market: t.market.map(|m| m.id().to_string()),
            timestamp_ms: t.timestamp.timestamp_millis(),
            exit_timestamp_ms: t.exit_timestamp.map(|ts| ts.timestamp_millis()),
            pnl: t.pnl,
            reported_pnl: t.reported_pnl,
            annotation: t.annotation,
            source_line: t.source_line,
        }
    }
}

/// Result of one import.
#[pyclass]
pub struct ImportReport {
    inner: RustImportReport,
}

#[pymethods]
impl ImportReport {
    /// All accepted trades.
    #[getter]
    fn accepted(&self) -> Vec<TradeCandidate> {
        self.inner.accepted.iter().cloned().map(Into::into).collect()
    }

    /// First `n` accepted trades, for confirmation before commit.
    #[pyo3(signature = (n=journal_core::DEFAULT_PREVIEW_ROWS))]
    fn preview(&self, n: usize) -> Vec<TradeCandidate> {
        self.inner.preview_n(n).iter().cloned().map(Into::into).collect()
    }

    #[getter]
    fn skipped_count(&self) -> usize {
        self.inner.skipped_count
    }

    #[getter]
    fn failed_count(&self) -> usize {
        self.inner.failed_count
    }

    #[getter]
    fn total_rows(&self) -> usize {
        self.inner.total_rows
    }

    #[getter]
    fn detected_market(&self) -> Option<String> {
        self.inner.detected_market.map(|m| m.id().to_string())
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.clone()
    }

    #[getter]
    fn is_ok(&self) -> bool {
        self.inner.is_ok()
    }

    /// Batch-level error message, if the import was aborted.
    #[getter]
    fn error(&self) -> Option<String> {
        self.inner.error.as_ref().map(|e| e.message.clone())
    }

    /// Fields that could not be mapped when the import was aborted.
    #[getter]
    fn missing_fields(&self) -> Vec<String> {
        self.inner
            .error
            .as_ref()
            .map(|e| e.missing_fields.iter().map(|f| f.label().to_string()).collect())
            .unwrap_or_default()
    }

    /// Typical columns of the detected market, when the import was aborted.
    #[getter]
    fn hint(&self) -> Vec<String> {
        self.inner
            .error
            .as_ref()
            .map(|e| e.hint.clone())
            .unwrap_or_default()
    }

    fn total_pnl(&self) -> f64 {
        self.inner.total_pnl()
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner
            .to_json()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __len__(&self) -> usize {
        self.inner.accepted.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "ImportReport(market={}, accepted={}, skipped={}, failed={})",
            journal_core::market_label(self.inner.detected_market),
            self.inner.accepted.len(),
            self.inner.skipped_count,
            self.inner.failed_count
        )
    }
}

// ============================================================================
// Engine Classes
// ============================================================================

/// Trade importer.
#[pyclass]
pub struct TradeImporter {
    inner: RustTradeImporter,
}

#[pymethods]
impl TradeImporter {
    /// Create an importer, optionally from a JSON configuration.
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => {
                RustConfig::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string()))?
            }
            None => RustConfig::default(),
        };
        Ok(TradeImporter {
            inner: RustTradeImporter::new(config),
        })
    }

    /// Import a comma-separated text blob. Never raises on bad input; check
    /// `ImportReport.error`.
    fn import_text(&self, py: Python<'_>, text: &str) -> ImportReport {
        let inner = py.allow_threads(|| self.inner.import(text));
        ImportReport { inner }
    }

    /// Current configuration as JSON.
    fn config_json(&self) -> PyResult<String> {
        self.inner
            .config()
            .to_json_string()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Market identifier for a single symbol, `None` if no pattern matches.
#[pyfunction]
fn classify_symbol(symbol: &str) -> Option<String> {
    MarketClassifier::default()
        .classify_from_symbol(symbol)
        .map(|m| m.id().to_string())
}

/// Market identifier for a header line, `None` when no market scores.
#[pyfunction]
fn classify_headers(headers: Vec<String>) -> Option<String> {
    MarketClassifier::default()
        .classify_from_headers(&headers)
        .map(|m| m.id().to_string())
}

/// Signed P&L of one trade using the market's unit multiplier.
#[pyfunction]
#[pyo3(signature = (side, entry_price, exit_price, quantity, market=None, symbol=""))]
fn compute_pnl(
    side: &str,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    market: Option<&str>,
    symbol: &str,
) -> PyResult<f64> {
    let market = parse_market(market)?;
    let side = normalize::normalize_side(side);
    let quantity = quantity.abs();
    let multiplier = unit_multiplier(market, symbol, quantity);
    Ok(pnl_from_parts(side, entry_price, exit_price, quantity, multiplier))
}

/// Parse a date cell to Unix milliseconds, `None` if no format matches.
#[pyfunction]
fn parse_date(raw: &str) -> Option<i64> {
    normalize::parse_date(raw).map(|d| d.value.timestamp_millis())
}

/// Normalize a side token to `"BUY"` or `"SELL"`.
#[pyfunction]
fn normalize_side(raw: &str) -> String {
    normalize::normalize_side(raw).to_string()
}

/// Install a tracing subscriber. `RUST_LOG` takes precedence over `level`.
/// Returns `False` if a subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> PyResult<bool> {
    use tracing_subscriber::EnvFilter;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| PyRuntimeError::new_err(format!("invalid log level {level:?}: {e}")))?,
    };
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Trade Journal Core - market-aware trade ingestion for Python.
#[pymodule]
fn trade_journal_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<TradeSide>()?;
    m.add_class::<TradeCandidate>()?;
    m.add_class::<ImportReport>()?;

    // Engine classes
    m.add_class::<TradeImporter>()?;

    // Functions
    m.add_function(wrap_pyfunction!(classify_symbol, m)?)?;
    m.add_function(wrap_pyfunction!(classify_headers, m)?)?;
    m.add_function(wrap_pyfunction!(compute_pnl, m)?)?;
    m.add_function(wrap_pyfunction!(parse_date, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_side, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    Ok(())
}
