//! Pure per-cell normalizers.

pub mod date;
pub mod numeric;
pub mod side;

pub use date::{parse_date, parse_date_or, DateFormat, ParsedDate};
pub use numeric::{is_numeric_cell, parse_amount, parse_price, parse_quantity};
pub use side::{normalize_side, parse_side};
