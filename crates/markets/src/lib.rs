//! Market knowledge base and market-type classification.
//!
//! This crate handles:
//! - The static registry of market definitions (keywords, symbol patterns,
//!   column vocabularies, unit multipliers)
//! - Futures contract multipliers by root
//! - Market inference from headers, sampled symbols, or a single symbol

pub mod classifier;
pub mod futures;
pub mod registry;

pub use classifier::MarketClassifier;
pub use futures::{futures_multiplier, futures_root};
pub use registry::{
    base_vocabulary, definition, definitions, normalize_token, vocabulary, MarketDefinition,
    UnitMultiplier,
};
