//! P&L calculator.
//!
//! `(exit - entry) * direction * quantity * multiplier`, where the multiplier
//! comes from the market registry. Trades without a market use 1.

use crate::lot_size::forex_lot_multiplier;
use journal_core::{MarketType, Side, TradeCandidate};
use journal_markets::{definition, futures_multiplier, UnitMultiplier};

/// Money per unit of price movement per unit of quantity.
pub fn unit_multiplier(market: Option<MarketType>, symbol: &str, quantity: f64) -> f64 {
    let Some(market) = market else {
        return 1.0;
    };
    match definition(market).multiplier {
        UnitMultiplier::Fixed(m) => m,
        UnitMultiplier::PerSymbol { default } => futures_multiplier(symbol).unwrap_or(default),
        UnitMultiplier::LotSize => forex_lot_multiplier(quantity),
    }
}

/// P&L from raw parts.
pub fn pnl_from_parts(
    side: Side,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    multiplier: f64,
) -> f64 {
    (exit_price - entry_price) * side.direction() * quantity * multiplier
}

/// Signed P&L of a trade, `None` unless both prices are present.
pub fn compute_pnl(trade: &TradeCandidate, market: Option<MarketType>) -> Option<f64> {
    let entry = trade.entry_price?;
    let exit = trade.exit_price?;
    let multiplier = unit_multiplier(market, &trade.symbol, trade.quantity);
    Some(pnl_from_parts(
        trade.side,
        entry,
        exit,
        trade.quantity,
        multiplier,
    ))
}
