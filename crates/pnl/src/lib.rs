//! Market-aware P&L computation.
//!
//! This crate handles:
//! - Unit multipliers per market (fixed, per futures root, forex lot size)
//! - Signed P&L of a normalized trade

pub mod calculator;
pub mod lot_size;

pub use calculator::{compute_pnl, pnl_from_parts, unit_multiplier};
pub use lot_size::{forex_lot_multiplier, LotScale};
