//! Side/direction vocabulary normalization.

use journal_core::Side;

const BUY_TOKENS: &[&str] = &[
    "buy", "long", "b", "1", "bought", "purchase", "bid", "call", "bullish", "bot",
];

const SELL_TOKENS: &[&str] = &[
    "sell", "short", "s", "-1", "sold", "sale", "ask", "put", "bearish", "close", "sld",
];

fn lookup(token: &str) -> Option<Side> {
    if BUY_TOKENS.contains(&token) {
        Some(Side::Buy)
    } else if SELL_TOKENS.contains(&token) {
        Some(Side::Sell)
    } else {
        None
    }
}

/// Recognize a side token, case-insensitive.
///
/// Multi-word broker values ("Buy to Open", "sell_short") fall back to their
/// first word. Returns `None` for tokens outside the vocabulary.
pub fn parse_side(raw: &str) -> Option<Side> {
    let token = raw.trim().to_lowercase();
    if token.is_empty() {
        return None;
    }
    if let Some(side) = lookup(&token) {
        return Some(side);
    }
    token
        .split(|c: char| c.is_whitespace() || c == '_')
        .find(|w| !w.is_empty())
        .and_then(lookup)
}

/// Normalize a side token. Unknown tokens are treated as a buy.
pub fn normalize_side(raw: &str) -> Side {
    parse_side(raw).unwrap_or(Side::Buy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_vocabulary() {
        for token in ["buy", "BUY", " Long ", "b", "1", "Bought", "purchase", "bid", "CALL", "bullish"] {
            assert_eq!(parse_side(token), Some(Side::Buy), "{token}");
        }
    }

    #[test]
    fn test_sell_vocabulary() {
        for token in ["sell", "SHORT", "s", "-1", "sold", "Sale", "ask", "put", "Bearish", "close"] {
            assert_eq!(parse_side(token), Some(Side::Sell), "{token}");
        }
    }

    #[test]
    fn test_multi_word_tokens() {
        assert_eq!(parse_side("Buy to Open"), Some(Side::Buy));
        assert_eq!(parse_side("SELL_SHORT"), Some(Side::Sell));
        assert_eq!(parse_side("sell to close"), Some(Side::Sell));
    }

    #[test]
    fn test_unknown_defaults_to_buy() {
        assert_eq!(parse_side("hold"), None);
        assert_eq!(parse_side(""), None);
        assert_eq!(normalize_side("hold"), Side::Buy);
        assert_eq!(normalize_side("   "), Side::Buy);
    }
}
