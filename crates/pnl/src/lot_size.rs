//! Forex lot-size inference.
//!
//! Exports state forex size in standard lots, micro lots or raw units with no
//! column saying which. The scale is guessed from the magnitude of the
//! quantity alone.

/// Units of base currency in one standard lot.
pub const STANDARD_LOT_UNITS: f64 = 100_000.0;

/// How a forex quantity is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotScale {
    /// Quantity below 0.01.
    Fractional,
    /// Quantity below 1, or between 1 and 1000: standard lots.
    Lots,
    /// Quantity of 1000 or more: raw currency units.
    Units,
}

impl LotScale {
    pub fn from_quantity(quantity: f64) -> Self {
        let q = quantity.abs();
        if q < 0.01 {
            LotScale::Fractional
        } else if q >= 1000.0 {
            LotScale::Units
        } else {
            LotScale::Lots
        }
    }

    /// Money per unit of price movement per unit of quantity.
    pub fn multiplier(self) -> f64 {
        match self {
            LotScale::Fractional => 100_000_000.0,
            LotScale::Lots => STANDARD_LOT_UNITS,
            LotScale::Units => 1.0,
        }
    }
}

/// Multiplier for a forex quantity.
pub fn forex_lot_multiplier(quantity: f64) -> f64 {
    LotScale::from_quantity(quantity).multiplier()
}
