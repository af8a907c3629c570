//! Fuzzy column-to-field mapping.
//!
//! Headers and vocabulary terms are compared in normalized form (lowercase,
//! alphanumerics only). A header matches a term if either contains the other.
//! Terms shorter than three characters ("pl", "bs") only match a header that
//! ends with them or has them as a separate word ("Net P/L", "B/S").
//! Binding runs in two passes over [`LogicalField::RESOLUTION_ORDER`]: the first
//! pass only accepts headers that contain a term, the second lets a header that
//! is an abbreviation of a term ("Price" for "entry_price") bind the fields still
//! open. Within a pass, the first unbound header in input order wins.

use journal_core::{ColumnMapping, LogicalField, MarketType};
use journal_markets::{normalize_token, vocabulary};
use tracing::debug;

/// Terms or headers shorter than this are never matched by plain containment.
const MIN_CONTAINMENT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Header contains the term.
    Forward,
    /// Term contains the header.
    Reverse,
}

/// A header in normalized form, whole and split into words.
#[derive(Debug)]
struct HeaderTokens {
    joined: String,
    words: Vec<String>,
}

impl HeaderTokens {
    fn new(raw: &str) -> Self {
        let words = raw
            .split(|c: char| c.is_whitespace() || c == '_')
            .map(normalize_token)
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            joined: normalize_token(raw),
            words,
        }
    }
}

fn term_matches(header: &HeaderTokens, term: &str, pass: Pass) -> bool {
    let joined = header.joined.as_str();
    if joined.is_empty() || term.is_empty() {
        return false;
    }
    if term.len() < MIN_CONTAINMENT_LEN {
        return pass == Pass::Forward
            && (joined.ends_with(term) || header.words.iter().any(|w| w == term));
    }
    if joined.len() < MIN_CONTAINMENT_LEN {
        return pass == Pass::Forward && joined == term;
    }
    match pass {
        Pass::Forward => joined.contains(term),
        Pass::Reverse => term.contains(joined),
    }
}

/// Map headers onto logical fields using the base vocabulary plus the
/// additions of `market`.
pub fn map_columns<S: AsRef<str>>(headers: &[S], market: Option<MarketType>) -> ColumnMapping {
    let tokens: Vec<HeaderTokens> = headers.iter().map(|h| HeaderTokens::new(h.as_ref())).collect();
    let vocabularies: Vec<(LogicalField, Vec<String>)> = LogicalField::RESOLUTION_ORDER
        .iter()
        .map(|&field| {
            let terms = vocabulary(field, market)
                .into_iter()
                .map(normalize_token)
                .collect();
            (field, terms)
        })
        .collect();

    let mut mapping = ColumnMapping::new();
    for pass in [Pass::Forward, Pass::Reverse] {
        for (field, terms) in &vocabularies {
            if mapping.contains(*field) {
                continue;
            }
            let found = tokens.iter().enumerate().find(|(i, header)| {
                !mapping.is_index_bound(*i)
                    && terms.iter().any(|term| term_matches(header, term, pass))
            });
            if let Some((index, _)) = found {
                mapping.bind(*field, index, headers[index].as_ref());
            }
        }
    }

    debug!(
        fields = mapping.len(),
        headers = headers.len(),
        market = ?market,
        "column mapping resolved"
    );
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(mapping: &ColumnMapping, field: LogicalField) -> Option<&str> {
        mapping.get(field).map(|c| c.header.as_str())
    }

    #[test]
    fn test_plain_stock_export() {
        let headers = ["Symbol", "Type", "Quantity", "Entry Price", "Entry Date"];
        let mapping = map_columns(&headers, None);
        assert_eq!(header_for(&mapping, LogicalField::Symbol), Some("Symbol"));
        assert_eq!(header_for(&mapping, LogicalField::Side), Some("Type"));
        assert_eq!(header_for(&mapping, LogicalField::Quantity), Some("Quantity"));
        assert_eq!(header_for(&mapping, LogicalField::EntryPrice), Some("Entry Price"));
        assert_eq!(header_for(&mapping, LogicalField::EntryDate), Some("Entry Date"));
        assert!(!mapping.contains(LogicalField::ExitPrice));
        assert!(mapping.missing_required().is_empty());
    }

    #[test]
    fn test_futures_vocabulary() {
        let headers = ["Contract", "Side", "Qty", "Entry Price", "Exit Price", "Date"];

        // Without the market, "Contract" is not a symbol term
        let base = map_columns(&headers, None);
        assert!(!base.contains(LogicalField::Symbol));

        let mapping = map_columns(&headers, Some(MarketType::Futures));
        assert_eq!(header_for(&mapping, LogicalField::Symbol), Some("Contract"));
        assert_eq!(header_for(&mapping, LogicalField::Quantity), Some("Qty"));
        assert_eq!(header_for(&mapping, LogicalField::ExitPrice), Some("Exit Price"));
        assert_eq!(header_for(&mapping, LogicalField::EntryDate), Some("Date"));
        assert_eq!(header_for(&mapping, LogicalField::Side), Some("Side"));
        assert!(!mapping.contains(LogicalField::ExitDate));
    }

    #[test]
    fn test_forex_export() {
        let headers = [
            "Pair",
            "Type",
            "Lot Size",
            "Open Price",
            "Close Price",
            "Open Time",
            "Close Time",
            "Profit",
        ];
        let mapping = map_columns(&headers, Some(MarketType::Forex));
        assert_eq!(header_for(&mapping, LogicalField::Symbol), Some("Pair"));
        assert_eq!(header_for(&mapping, LogicalField::Quantity), Some("Lot Size"));
        assert_eq!(header_for(&mapping, LogicalField::EntryPrice), Some("Open Price"));
        assert_eq!(header_for(&mapping, LogicalField::ExitPrice), Some("Close Price"));
        assert_eq!(header_for(&mapping, LogicalField::EntryDate), Some("Open Time"));
        assert_eq!(header_for(&mapping, LogicalField::ExitDate), Some("Close Time"));
        assert_eq!(header_for(&mapping, LogicalField::Pnl), Some("Profit"));
        assert_eq!(header_for(&mapping, LogicalField::Side), Some("Type"));
    }

    #[test]
    fn test_abbreviated_headers_bind_in_second_pass() {
        let headers = ["Ticker", "Price", "Shares", "Exit Date"];
        let mapping = map_columns(&headers, None);
        assert_eq!(header_for(&mapping, LogicalField::EntryPrice), Some("Price"));
        assert_eq!(header_for(&mapping, LogicalField::Quantity), Some("Shares"));
        assert_eq!(header_for(&mapping, LogicalField::ExitDate), Some("Exit Date"));
        // "Exit Date" is not reused for the entry date
        assert!(!mapping.contains(LogicalField::EntryDate));
    }

    #[test]
    fn test_exit_date_before_entry_date_in_input() {
        let headers = ["Symbol", "Exit Date", "Entry Date", "Qty", "Price"];
        let mapping = map_columns(&headers, None);
        assert_eq!(header_for(&mapping, LogicalField::ExitDate), Some("Exit Date"));
        assert_eq!(header_for(&mapping, LogicalField::EntryDate), Some("Entry Date"));
    }

    #[test]
    fn test_short_tokens_need_word_or_suffix_match() {
        let headers = ["Symbol", "ID", "Multiplier", "P&L", "B/S"];
        let mapping = map_columns(&headers, None);
        assert_eq!(header_for(&mapping, LogicalField::Pnl), Some("P&L"));
        assert_eq!(header_for(&mapping, LogicalField::Side), Some("B/S"));
        assert!(!mapping.is_index_bound(1));
        assert!(!mapping.is_index_bound(2));
    }

    #[test]
    fn test_spaced_pnl_headers() {
        for pnl in ["Net P/L", "Total P&L", "Gross P/L", "P&L ($)", "NetP/L"] {
            let headers = ["Symbol", "Qty", pnl];
            let mapping = map_columns(&headers, None);
            assert_eq!(header_for(&mapping, LogicalField::Pnl), Some(pnl), "{pnl}");
            assert!(mapping.is_viable(), "{pnl}");
        }
    }

    #[test]
    fn test_first_matching_header_wins() {
        let headers = ["Symbol", "Underlying Symbol", "Qty"];
        let mapping = map_columns(&headers, None);
        assert_eq!(header_for(&mapping, LogicalField::Symbol), Some("Symbol"));
    }

    #[test]
    fn test_unmappable_headers() {
        let headers = ["Foo", "Bar"];
        let mapping = map_columns(&headers, None);
        assert!(mapping.is_empty());
        assert!(!mapping.is_viable());
        assert_eq!(mapping.missing_required().len(), 3);
    }
}
