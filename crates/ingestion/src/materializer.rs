//! Row materialization: one raw row plus a column mapping into a trade candidate.
//!
//! Rows are independent of each other; a [`RowMaterializer`] only borrows
//! batch-level context and can be shared across threads.

use crate::normalize::{
    is_numeric_cell, parse_amount, parse_date, parse_price, parse_quantity, parse_side,
};
use chrono::{DateTime, Utc};
use journal_core::config::IngestionConfig;
use journal_core::{ColumnMapping, LogicalField, MarketType, RawRow, Side, TradeCandidate};
use journal_pnl::compute_pnl;
use std::fmt;

/// Placeholders some exports write into empty numeric cells.
const EMPTY_PLACEHOLDERS: &[&str] = &["-", "--", "n/a", "na", "none"];

/// Why a row was skipped under the acceptance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSymbol,
    NonPositiveQuantity,
    /// Neither a positive entry price nor a direct P&L column.
    NoPriceOrPnl,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingSymbol => f.write_str("missing symbol"),
            SkipReason::NonPositiveQuantity => f.write_str("quantity is not positive"),
            SkipReason::NoPriceOrPnl => f.write_str("no entry price or P&L"),
        }
    }
}

/// A row that did not produce a trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    /// Rejected by the acceptance rules; counted as skipped.
    Skipped(SkipReason),
    /// Rejected by the acceptance rules because the deciding cell is not a
    /// number; counted as failed.
    Failed {
        reason: SkipReason,
        field: LogicalField,
        value: String,
    },
}

impl RowRejection {
    pub fn is_failure(&self) -> bool {
        matches!(self, RowRejection::Failed { .. })
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::Skipped(reason) => write!(f, "skipped: {reason}"),
            RowRejection::Failed {
                reason,
                field,
                value,
            } => write!(f, "{reason}, unreadable {field}: {value:?}"),
        }
    }
}

/// Heuristic fallbacks taken while materializing a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowNotes {
    /// Entry date missing or unparseable; the fallback time was used.
    pub date_defaulted: bool,
    /// Side cell held an unknown token; treated as a buy.
    pub unknown_side: bool,
    /// Mapped numeric cells that were not numbers and read as absent.
    pub unreadable_cells: usize,
}

/// A mapped numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericCell<'r> {
    Absent,
    Number(&'r str),
    Unreadable(&'r str),
}

impl<'r> NumericCell<'r> {
    fn number(self) -> Option<&'r str> {
        match self {
            NumericCell::Number(v) => Some(v),
            _ => None,
        }
    }

    fn unreadable(self) -> Option<&'r str> {
        match self {
            NumericCell::Unreadable(v) => Some(v),
            _ => None,
        }
    }
}

/// An accepted row.
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    pub trade: TradeCandidate,
    pub notes: RowNotes,
}

/// Turns raw rows of one batch into trade candidates.
#[derive(Debug, Clone, Copy)]
pub struct RowMaterializer<'a> {
    headers: &'a [String],
    mapping: &'a ColumnMapping,
    market: Option<MarketType>,
    config: &'a IngestionConfig,
    fallback_time: DateTime<Utc>,
}

impl<'a> RowMaterializer<'a> {
    pub fn new(
        headers: &'a [String],
        mapping: &'a ColumnMapping,
        market: Option<MarketType>,
        config: &'a IngestionConfig,
        fallback_time: DateTime<Utc>,
    ) -> Self {
        Self {
            headers,
            mapping,
            market,
            config,
            fallback_time,
        }
    }

    fn cell<'r>(&self, row: &'r RawRow, field: LogicalField) -> Option<&'r str> {
        self.mapping
            .index_of(field)
            .and_then(|i| row.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn is_placeholder(&self, value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        self.config.is_meaningless(value) || EMPTY_PLACEHOLDERS.contains(&lower.as_str())
    }

    fn numeric_cell<'r>(&self, row: &'r RawRow, field: LogicalField) -> NumericCell<'r> {
        match self.cell(row, field) {
            None => NumericCell::Absent,
            Some(v) if is_numeric_cell(v) => NumericCell::Number(v),
            Some(v) if self.is_placeholder(v) => NumericCell::Absent,
            Some(v) => NumericCell::Unreadable(v),
        }
    }

    /// Rejection for a failed acceptance rule, marked as a failure when the
    /// deciding cell was unreadable.
    fn reject(reason: SkipReason, field: LogicalField, cell: NumericCell<'_>) -> RowRejection {
        match cell.unreadable() {
            Some(value) => RowRejection::Failed {
                reason,
                field,
                value: value.to_string(),
            },
            None => RowRejection::Skipped(reason),
        }
    }

    /// Materialize one row.
    ///
    /// Unreadable numeric cells count as absent: 0 for the quantity and no
    /// value for prices and P&L.
    pub fn materialize(&self, row: &RawRow) -> Result<Materialized, RowRejection> {
        let symbol = self
            .cell(row, LogicalField::Symbol)
            .map(|s| s.to_uppercase())
            .ok_or(RowRejection::Skipped(SkipReason::MissingSymbol))?;

        let quantity_cell = self.numeric_cell(row, LogicalField::Quantity);
        let entry_cell = self.numeric_cell(row, LogicalField::EntryPrice);
        let exit_cell = self.numeric_cell(row, LogicalField::ExitPrice);
        let pnl_cell = self.numeric_cell(row, LogicalField::Pnl);

        let signed_quantity = quantity_cell.number().map(parse_quantity).unwrap_or(0.0);
        let entry_price = entry_cell.number().and_then(parse_price);
        let exit_price = exit_cell.number().and_then(parse_price);
        let reported_pnl = pnl_cell.number().and_then(parse_amount);

        let mut notes = RowNotes::default();
        let side = match self.cell(row, LogicalField::Side) {
            Some(token) => parse_side(token).unwrap_or_else(|| {
                notes.unknown_side = true;
                Side::Buy
            }),
            None if signed_quantity < 0.0 => Side::Sell,
            None => Side::Buy,
        };
        let quantity = signed_quantity.abs();

        if quantity <= 0.0 {
            return Err(Self::reject(
                SkipReason::NonPositiveQuantity,
                LogicalField::Quantity,
                quantity_cell,
            ));
        }
        let has_entry = entry_price.map_or(false, |p| p > 0.0);
        if !has_entry && !self.mapping.contains(LogicalField::Pnl) {
            return Err(Self::reject(
                SkipReason::NoPriceOrPnl,
                LogicalField::EntryPrice,
                entry_cell,
            ));
        }
        notes.unreadable_cells = [quantity_cell, entry_cell, exit_cell, pnl_cell]
            .iter()
            .filter(|c| c.unreadable().is_some())
            .count();

        let timestamp = match self.cell(row, LogicalField::EntryDate).and_then(parse_date) {
            Some(parsed) => parsed.value,
            None => {
                notes.date_defaulted = true;
                self.fallback_time
            }
        };
        let exit_timestamp = self
            .cell(row, LogicalField::ExitDate)
            .and_then(parse_date)
            .map(|d| d.value);

        let mut trade = TradeCandidate {
            symbol,
            side,
            entry_price,
            exit_price,
            quantity,
            market: self.market,
            timestamp,
            exit_timestamp,
            pnl: None,
            reported_pnl,
            annotation: self.annotation(row),
            source_line: row.line,
        };
        trade.pnl = compute_pnl(&trade, self.market);

        Ok(Materialized { trade, notes })
    }

    /// Notes value followed by every unmapped cell as `Header: value`.
    fn annotation(&self, row: &RawRow) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(notes) = self.cell(row, LogicalField::Notes) {
            if !self.config.is_meaningless(notes) {
                parts.push(notes.to_string());
            }
        }

        for (index, value) in row.values.iter().enumerate() {
            if self.mapping.is_index_bound(index) || self.config.is_meaningless(value) {
                continue;
            }
            let value = value.trim();
            match self.headers.get(index).map(|h| h.trim()).filter(|h| !h.is_empty()) {
                Some(header) => parts.push(format!("{header}: {value}")),
                // Unnamed or extra cells keep their 1-based position
                None => parts.push(format!("#{}: {value}", index + 1)),
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(&self.config.annotation_separator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Datelike, TimeZone};

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn mapping_of(headers: &[String], fields: &[(LogicalField, usize)]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        for &(field, index) in fields {
            mapping.bind(field, index, headers[index].clone());
        }
        mapping
    }

    fn row(values: &[&str]) -> RawRow {
        RawRow::new(2, values.iter().map(|s| s.to_string()).collect())
    }

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap()
    }

    fn stock_setup() -> (Vec<String>, ColumnMapping) {
        let headers = headers(&["Symbol", "Type", "Quantity", "Entry Price", "Entry Date"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Side, 1),
                (LogicalField::Quantity, 2),
                (LogicalField::EntryPrice, 3),
                (LogicalField::EntryDate, 4),
            ],
        );
        (headers, mapping)
    }

    #[test]
    fn test_stock_row() {
        let (headers, mapping) = stock_setup();
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, Some(MarketType::Stocks), &config, fallback());

        let out = m
            .materialize(&row(&["aapl", "BUY", "100", "150.50", "2024-01-15"]))
            .unwrap();
        let trade = out.trade;
        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.side, Side::Buy);
        assert_relative_eq!(trade.quantity, 100.0);
        assert_relative_eq!(trade.entry_price.unwrap(), 150.5);
        assert_eq!(trade.timestamp.day(), 15);
        assert_eq!(trade.market, Some(MarketType::Stocks));
        // No exit price, no P&L
        assert_eq!(trade.pnl, None);
        assert_eq!(trade.annotation, None);
        assert_eq!(out.notes, RowNotes::default());
    }

    #[test]
    fn test_negative_quantity_without_side_column() {
        let headers = headers(&["Symbol", "Qty", "Price"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Quantity, 1),
                (LogicalField::EntryPrice, 2),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let trade = m.materialize(&row(&["TSLA", "-50", "200"])).unwrap().trade;
        assert_eq!(trade.side, Side::Sell);
        assert_relative_eq!(trade.quantity, 50.0);
    }

    #[test]
    fn test_side_column_wins_over_sign() {
        let (headers, mapping) = stock_setup();
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let trade = m
            .materialize(&row(&["AAPL", "Buy", "-10", "150", "2024-01-15"]))
            .unwrap()
            .trade;
        assert_eq!(trade.side, Side::Buy);
        assert_relative_eq!(trade.quantity, 10.0);

        // Blank side cell falls back to the sign
        let trade = m
            .materialize(&row(&["AAPL", "", "-10", "150", "2024-01-15"]))
            .unwrap()
            .trade;
        assert_eq!(trade.side, Side::Sell);
    }

    #[test]
    fn test_unknown_side_is_buy() {
        let (headers, mapping) = stock_setup();
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let out = m
            .materialize(&row(&["AAPL", "hold", "10", "150", "2024-01-15"]))
            .unwrap();
        assert_eq!(out.trade.side, Side::Buy);
        assert!(out.notes.unknown_side);
    }

    #[test]
    fn test_acceptance_rules() {
        let (headers, mapping) = stock_setup();
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        assert_eq!(
            m.materialize(&row(&["", "BUY", "10", "150", "2024-01-15"])),
            Err(RowRejection::Skipped(SkipReason::MissingSymbol))
        );
        assert_eq!(
            m.materialize(&row(&["AAPL", "BUY", "0", "150", "2024-01-15"])),
            Err(RowRejection::Skipped(SkipReason::NonPositiveQuantity))
        );
        assert_eq!(
            m.materialize(&row(&["AAPL", "BUY", "10", "", "2024-01-15"])),
            Err(RowRejection::Skipped(SkipReason::NoPriceOrPnl))
        );
        assert_eq!(
            m.materialize(&row(&["AAPL", "BUY", "10", "0", "2024-01-15"])),
            Err(RowRejection::Skipped(SkipReason::NoPriceOrPnl))
        );
    }

    #[test]
    fn test_unreadable_entry_price_fails_row() {
        let (headers, mapping) = stock_setup();
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let rejection = m
            .materialize(&row(&["AAPL", "BUY", "10", "abc", "2024-01-15"]))
            .unwrap_err();
        assert!(rejection.is_failure());
        assert_eq!(
            rejection,
            RowRejection::Failed {
                reason: SkipReason::NoPriceOrPnl,
                field: LogicalField::EntryPrice,
                value: "abc".to_string(),
            }
        );

        let rejection = m
            .materialize(&row(&["AAPL", "BUY", "ten", "150", "2024-01-15"]))
            .unwrap_err();
        assert_eq!(
            rejection,
            RowRejection::Failed {
                reason: SkipReason::NonPositiveQuantity,
                field: LogicalField::Quantity,
                value: "ten".to_string(),
            }
        );

        // Placeholders read as absent, not unreadable
        assert_eq!(
            m.materialize(&row(&["AAPL", "BUY", "10", "n/a", "2024-01-15"])),
            Err(RowRejection::Skipped(SkipReason::NoPriceOrPnl))
        );
    }

    #[test]
    fn test_open_position_exit_is_absent() {
        let headers = headers(&["Symbol", "Side", "Qty", "Entry Price", "Exit Price", "Date"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Side, 1),
                (LogicalField::Quantity, 2),
                (LogicalField::EntryPrice, 3),
                (LogicalField::ExitPrice, 4),
                (LogicalField::EntryDate, 5),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, Some(MarketType::Stocks), &config, fallback());

        let out = m
            .materialize(&row(&["AAPL", "BUY", "10", "150", "OPEN", "2024-01-15"]))
            .unwrap();
        assert_relative_eq!(out.trade.entry_price.unwrap(), 150.0);
        assert_eq!(out.trade.exit_price, None);
        assert_eq!(out.trade.pnl, None);
        assert_eq!(out.notes.unreadable_cells, 1);
    }

    #[test]
    fn test_unreadable_entry_uses_reported_pnl() {
        let headers = headers(&["Symbol", "Qty", "Entry Price", "Realized P&L"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Quantity, 1),
                (LogicalField::EntryPrice, 2),
                (LogicalField::Pnl, 3),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let out = m.materialize(&row(&["AAPL", "10", "pending", "25"])).unwrap();
        assert_eq!(out.trade.entry_price, None);
        assert_eq!(out.trade.pnl, None);
        assert_relative_eq!(out.trade.reported_pnl.unwrap(), 25.0);
        assert_eq!(out.notes.unreadable_cells, 1);
    }

    #[test]
    fn test_reported_pnl_without_prices() {
        let headers = headers(&["Symbol", "Qty", "Realized P&L"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Quantity, 1),
                (LogicalField::Pnl, 2),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let trade = m.materialize(&row(&["MSFT", "5", "(42.50)"])).unwrap().trade;
        assert_eq!(trade.pnl, None);
        assert_relative_eq!(trade.reported_pnl.unwrap(), -42.5);
        assert_relative_eq!(trade.effective_pnl().unwrap(), -42.5);
    }

    #[test]
    fn test_missing_date_uses_fallback() {
        let headers = headers(&["Symbol", "Qty", "Price"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Quantity, 1),
                (LogicalField::EntryPrice, 2),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let out = m.materialize(&row(&["AAPL", "1", "10"])).unwrap();
        assert_eq!(out.trade.timestamp, fallback());
        assert!(out.notes.date_defaulted);
    }

    #[test]
    fn test_annotation_collects_unmapped_columns() {
        let headers = headers(&["Symbol", "Qty", "Price", "Notes", "Commission", "Fees", "Account"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Quantity, 1),
                (LogicalField::EntryPrice, 2),
                (LogicalField::Notes, 3),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, None, &config, fallback());

        let trade = m
            .materialize(&row(&["AAPL", "1", "10", "scalp", "1.5", "0.00", "IBKR", "extra"]))
            .unwrap()
            .trade;
        assert_eq!(
            trade.annotation.as_deref(),
            Some("scalp | Commission: 1.5 | Account: IBKR | #8: extra")
        );

        let trade = m
            .materialize(&row(&["AAPL", "1", "10", "null", "0", "", "undefined"]))
            .unwrap()
            .trade;
        assert_eq!(trade.annotation, None);
    }

    #[test]
    fn test_futures_pnl_uses_contract_multiplier() {
        let headers = headers(&["Contract", "Side", "Qty", "Entry Price", "Exit Price", "Date"]);
        let mapping = mapping_of(
            &headers,
            &[
                (LogicalField::Symbol, 0),
                (LogicalField::Side, 1),
                (LogicalField::Quantity, 2),
                (LogicalField::EntryPrice, 3),
                (LogicalField::ExitPrice, 4),
                (LogicalField::EntryDate, 5),
            ],
        );
        let config = IngestionConfig::default();
        let m = RowMaterializer::new(&headers, &mapping, Some(MarketType::Futures), &config, fallback());

        let trade = m
            .materialize(&row(&["ES", "BUY", "2", "4500", "4510", "2024-01-15"]))
            .unwrap()
            .trade;
        assert_relative_eq!(trade.exit_price.unwrap(), 4510.0);
        assert_relative_eq!(trade.pnl.unwrap(), 1000.0);
    }
}
