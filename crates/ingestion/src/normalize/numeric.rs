//! Numeric coercion.
//!
//! Quantities coerce to 0 when absent or malformed. Prices and P&L stay
//! `None`, so an absent price reads as "not computable" rather than zero.

fn clean(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect()
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Quantity from a cell; 0 when empty or non-numeric. Sign is preserved.
pub fn parse_quantity(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Price from a cell; `None` when empty or non-numeric.
pub fn parse_price(raw: &str) -> Option<f64> {
    parse_number(raw)
}

/// Monetary amount such as a realized P&L. Accepts accounting negatives: `(12.50)`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(inner) => parse_number(inner).map(|v| -v.abs()),
        None => parse_number(trimmed),
    }
}

/// Whether a non-empty cell holds a number (as understood by [`parse_amount`]).
pub fn is_numeric_cell(raw: &str) -> bool {
    parse_amount(raw).is_some()
}
