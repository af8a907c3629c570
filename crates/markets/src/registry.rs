//! Static market definitions.
//!
//! Per-market behaviour is a lookup table indexed by [`MarketType`]: identifier
//! keywords and typical columns drive header scoring, symbol patterns drive
//! symbol classification, vocabulary additions extend the column mapper, and
//! the unit multiplier drives P&L.

use journal_core::{LogicalField, MarketType};
use regex::Regex;
use std::sync::OnceLock;

/// How one unit of price movement converts to money for a market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitMultiplier {
    /// Same multiplier for every symbol.
    Fixed(f64),
    /// Looked up per contract root; `default` for unknown roots.
    PerSymbol { default: f64 },
    /// Inferred from the magnitude of the quantity (forex lots).
    LotSize,
}

/// Definition of one market type.
#[derive(Debug)]
pub struct MarketDefinition {
    pub market: MarketType,
    pub display_name: &'static str,
    /// Words whose presence in a header strongly indicates this market.
    pub identifier_keywords: &'static [&'static str],
    /// Symbol patterns, tried in order.
    pub symbol_patterns: Vec<Regex>,
    /// Header terms typical for this market's exports.
    pub typical_columns: &'static [&'static str],
    /// Market-specific additions to the base column vocabulary.
    pub vocabulary_additions: &'static [(LogicalField, &'static [&'static str])],
    pub multiplier: UnitMultiplier,
    pub has_expiration: bool,
    pub has_strike: bool,
}

impl MarketDefinition {
    /// Whether any of this market's symbol patterns matches.
    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbol_patterns.iter().any(|p| p.is_match(symbol))
    }

    /// Additional vocabulary for one field.
    pub fn additions_for(&self, field: LogicalField) -> &'static [&'static str] {
        self.vocabulary_additions
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, terms)| *terms)
            .unwrap_or(&[])
    }

    /// Typical columns, as shown to users whose file could not be mapped.
    pub fn column_hint(&self) -> Vec<String> {
        self.typical_columns.iter().map(|s| s.to_string()).collect()
    }
}

const FOREX_CODES: &str = "EUR|USD|GBP|JPY|AUD|NZD|CAD|CHF|SEK|NOK|DKK|SGD|HKD|MXN|ZAR|TRY|PLN|CNH";

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid symbol pattern {p:?}: {e}")))
        .collect()
}

fn build_registry() -> Vec<MarketDefinition> {
    let forex_pair = format!("^(?:{FOREX_CODES})[/._-]?(?:{FOREX_CODES})$");

    vec![
        MarketDefinition {
            market: MarketType::Futures,
            display_name: "Futures",
            identifier_keywords: &["futures", "future", "contract", "tick_value", "tick_size"],
            symbol_patterns: compile(&[
                r"^[A-Z]{2}$",
                r"^(?:ES|NQ|YM|RTY|MES|MNQ|MYM|M2K|CL|MCL|NG|GC|MGC|SI|HG|ZB|ZN|ZF|ZT|ZC|ZS|ZW|6E|6J|6B)$",
                r"^/?[A-Z0-9]{1,3}[FGHJKMNQUVXZ]\d{1,2}$",
                r"^/[A-Z0-9]{1,3}$",
            ]),
            typical_columns: &[
                "contract",
                "contracts",
                "root",
                "expiry",
                "tick_value",
                "multiplier",
                "point_value",
            ],
            vocabulary_additions: &[
                (LogicalField::Symbol, &["contract", "root"]),
                (LogicalField::Quantity, &["contracts"]),
            ],
            multiplier: UnitMultiplier::PerSymbol { default: 1.0 },
            has_expiration: true,
            has_strike: false,
        },
        MarketDefinition {
            market: MarketType::Options,
            display_name: "Options",
            identifier_keywords: &["option", "strike", "expiration", "call", "put", "premium"],
            symbol_patterns: compile(&[
                r"^[A-Z]{1,6}\s*\d{6}[CP]\d{8}$",
                r"^[A-Z]{1,6}\s+\d{1,2}/\d{1,2}/\d{2,4}\s+\d+(?:\.\d+)?\s*[CP]",
                r"^[A-Z]{1,6}\s+\d+(?:\.\d+)?\s*(?:C|P|CALL|PUT)$",
            ]),
            typical_columns: &[
                "strike",
                "expiration",
                "expiry",
                "option_type",
                "call_put",
                "premium",
                "underlying",
                "contracts",
                "delta",
            ],
            vocabulary_additions: &[
                (LogicalField::Symbol, &["underlying", "option_symbol"]),
                (LogicalField::Quantity, &["contracts"]),
                (LogicalField::EntryPrice, &["premium", "open_premium"]),
            ],
            multiplier: UnitMultiplier::Fixed(100.0),
            has_expiration: true,
            has_strike: true,
        },
        MarketDefinition {
            market: MarketType::Forex,
            display_name: "Forex",
            identifier_keywords: &["forex", "fx", "pip", "lot_size", "currency"],
            symbol_patterns: compile(&[forex_pair.as_str()]),
            typical_columns: &[
                "pips",
                "lot",
                "lots",
                "lot_size",
                "currency_pair",
                "swap",
                "base_currency",
                "quote_currency",
            ],
            vocabulary_additions: &[
                (LogicalField::Symbol, &["currency_pair", "pair"]),
                (LogicalField::Quantity, &["lot_size", "lots"]),
            ],
            multiplier: UnitMultiplier::LotSize,
            has_expiration: false,
            has_strike: false,
        },
        MarketDefinition {
            market: MarketType::Crypto,
            display_name: "Crypto",
            identifier_keywords: &["crypto", "btc", "usdt", "coin", "token", "wallet", "blockchain"],
            symbol_patterns: compile(&[
                r"^[A-Z0-9]{2,10}[/_-]?(?:USDT|USDC|BUSD|USD|BTC|ETH|EUR)$",
                r"^(?:BTC|ETH|SOL|XRP|ADA|DOGE|LTC|BNB|AVAX|MATIC|DOT|SHIB|USDT|USDC)$",
            ]),
            typical_columns: &[
                "coin",
                "token",
                "wallet",
                "network",
                "fee_currency",
                "base_asset",
                "quote_asset",
                "tx_hash",
            ],
            vocabulary_additions: &[
                (LogicalField::Symbol, &["coin", "token", "pair"]),
                (LogicalField::Quantity, &["amount", "filled"]),
            ],
            multiplier: UnitMultiplier::Fixed(1.0),
            has_expiration: false,
            has_strike: false,
        },
        MarketDefinition {
            market: MarketType::Stocks,
            display_name: "Stocks",
            identifier_keywords: &["stock", "equity", "equities", "shares", "nyse", "nasdaq"],
            symbol_patterns: compile(&[r"^[A-Z]{1,5}(?:\.[A-Z]{1,2})?$"]),
            typical_columns: &["ticker", "shares", "cusip", "isin", "dividend", "exchange"],
            vocabulary_additions: &[
                (LogicalField::Symbol, &["ticker", "stock"]),
                (LogicalField::Quantity, &["shares"]),
            ],
            multiplier: UnitMultiplier::Fixed(1.0),
            has_expiration: false,
            has_strike: false,
        },
    ]
}

static REGISTRY: OnceLock<Vec<MarketDefinition>> = OnceLock::new();

/// All market definitions in registry order.
pub fn definitions() -> &'static [MarketDefinition] {
    REGISTRY.get_or_init(build_registry)
}

/// Definition for one market.
pub fn definition(market: MarketType) -> &'static MarketDefinition {
    let index = MarketType::ALL
        .iter()
        .position(|m| *m == market)
        .unwrap_or_default();
    &definitions()[index]
}

/// Base vocabulary for a logical field, shared by every market.
pub fn base_vocabulary(field: LogicalField) -> &'static [&'static str] {
    match field {
        LogicalField::Symbol => &[
            "symbol",
            "ticker",
            "instrument",
            "security",
            "pair",
            "product",
            "underlying_symbol",
        ],
        LogicalField::Quantity => &[
            "quantity",
            "qty",
            "size",
            "shares",
            "contracts",
            "volume",
            "amount",
            "units",
            "lots",
            "position_size",
            "filled_qty",
        ],
        LogicalField::EntryPrice => &[
            "entry_price",
            "entryprice",
            "open_price",
            "buy_price",
            "avg_entry",
            "average_price",
            "avg_price",
            "fill_price",
            "execution_price",
            "entry_px",
            "avg_fill",
        ],
        LogicalField::ExitPrice => &[
            "exit_price",
            "close_price",
            "closing_price",
            "sell_price",
            "exit_px",
            "avg_exit",
            "exit_avg",
            "closed_price",
        ],
        LogicalField::ExitDate => &[
            "exit_date",
            "exit_time",
            "close_date",
            "close_time",
            "closed_at",
            "exit_timestamp",
            "closing_date",
            "date_closed",
        ],
        LogicalField::EntryDate => &[
            "date",
            "time",
            "timestamp",
            "datetime",
            "entry_date",
            "open_date",
            "trade_date",
            "executed_at",
            "opened_at",
            "open_time",
            "filled_at",
            "created_at",
        ],
        LogicalField::Pnl => &[
            "pnl",
            "pl",
            "p_l",
            "profit",
            "profit_loss",
            "realized_pnl",
            "net_pnl",
            "gain_loss",
            "realized",
            "net_profit",
        ],
        LogicalField::Side => &[
            "side",
            "type",
            "direction",
            "action",
            "buy_sell",
            "b_s",
            "long_short",
            "trade_type",
            "transaction_type",
            "order_side",
        ],
        LogicalField::Notes => &[
            "notes",
            "note",
            "comment",
            "comments",
            "memo",
            "description",
            "remarks",
            "tags",
        ],
    }
}

/// Base vocabulary plus the market's additions, in that order.
pub fn vocabulary(field: LogicalField, market: Option<MarketType>) -> Vec<&'static str> {
    let mut terms = base_vocabulary(field).to_vec();
    if let Some(market) = market {
        for term in definition(market).additions_for(field) {
            if !terms.contains(term) {
                terms.push(term);
            }
        }
    }
    terms
}

/// Lower-case and strip everything that is not alphanumeric.
///
/// `"Entry Price"`, `"entry_price"` and `"ENTRY-PRICE"` all become `"entryprice"`.
pub fn normalize_token(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
