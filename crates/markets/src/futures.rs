//! Futures contract multipliers.
//!
//! Maps contract roots to the dollar value of a one-point move. Symbols may
//! carry a leading `/` and a trailing month code plus year (`/ESZ4`, `MNQH25`).

/// Dollar value per point, by contract root.
const CONTRACT_MULTIPLIERS: &[(&str, f64)] = &[
    // Equity index
    ("ES", 50.0),
    ("NQ", 20.0),
    ("YM", 5.0),
    ("RTY", 50.0),
    ("MES", 5.0),
    ("MNQ", 2.0),
    ("MYM", 0.5),
    ("M2K", 5.0),
    // Energy
    ("CL", 1000.0),
    ("MCL", 100.0),
    ("NG", 10000.0),
    // Metals
    ("GC", 100.0),
    ("MGC", 10.0),
    ("SI", 5000.0),
    ("HG", 25000.0),
    // Rates
    ("ZB", 1000.0),
    ("ZN", 1000.0),
    ("ZF", 1000.0),
    ("ZT", 2000.0),
    // Grains
    ("ZC", 50.0),
    ("ZS", 50.0),
    ("ZW", 50.0),
    // Currencies
    ("6E", 125000.0),
    ("6J", 12500000.0),
    ("6B", 62500.0),
];

/// CME month codes.
const MONTH_CODES: &[char] = &['F', 'G', 'H', 'J', 'K', 'M', 'N', 'Q', 'U', 'V', 'X', 'Z'];

fn lookup(root: &str) -> Option<f64> {
    CONTRACT_MULTIPLIERS
        .iter()
        .find(|(r, _)| *r == root)
        .map(|(_, m)| *m)
}

/// Extract the contract root: `"/ESZ4"` -> `"ES"`, `"MNQH25"` -> `"MNQ"`.
///
/// A trailing month code plus 1-4 digit year is stripped only when something
/// remains in front of it. Symbols without an expiry suffix are returned as-is.
pub fn futures_root(symbol: &str) -> String {
    let upper = symbol.trim().to_ascii_uppercase();
    let s = upper.strip_prefix('/').unwrap_or(&upper);

    if lookup(s).is_some() {
        return s.to_string();
    }

    if let Some(pos) = s.rfind(|c: char| c.is_ascii_alphabetic()) {
        let (head, tail) = s.split_at(pos);
        let mut chars = tail.chars();
        let month = chars.next();
        let year = chars.as_str();
        let is_expiry = month.map_or(false, |m| MONTH_CODES.contains(&m))
            && (1..=4).contains(&year.len())
            && year.chars().all(|c| c.is_ascii_digit());
        if is_expiry && !head.is_empty() {
            return head.to_string();
        }
    }

    s.to_string()
}

/// Dollar value per point for a futures symbol, `None` for unknown roots.
pub fn futures_multiplier(symbol: &str) -> Option<f64> {
    lookup(&futures_root(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_root_extraction() {
        assert_eq!(futures_root("ES"), "ES");
        assert_eq!(futures_root("/ESZ4"), "ES");
        assert_eq!(futures_root("esh24"), "ES");
        assert_eq!(futures_root("MNQH25"), "MNQ");
        assert_eq!(futures_root("M2KU4"), "M2K");
        assert_eq!(futures_root("6EM24"), "6E");
        // No expiry suffix
        assert_eq!(futures_root("XYZ"), "XYZ");
    }

    #[test]
    fn test_known_multipliers() {
        assert_relative_eq!(futures_multiplier("ES").unwrap(), 50.0);
        assert_relative_eq!(futures_multiplier("/NQZ4").unwrap(), 20.0);
        assert_relative_eq!(futures_multiplier("MESZ24").unwrap(), 5.0);
        assert_relative_eq!(futures_multiplier("CLF5").unwrap(), 1000.0);
        assert_relative_eq!(futures_multiplier("MYM").unwrap(), 0.5);
    }

    #[test]
    fn test_micro_not_confused_with_full_size() {
        // MES must not resolve to ES
        assert_relative_eq!(futures_multiplier("MES").unwrap(), 5.0);
        assert_relative_eq!(futures_multiplier("MCLZ4").unwrap(), 100.0);
    }

    #[test]
    fn test_unknown_root() {
        assert!(futures_multiplier("ZZ").is_none());
        assert!(futures_multiplier("").is_none());
    }
}
