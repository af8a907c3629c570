//! Market-type inference.
//!
//! Selects a market from the header line (keyword/vocabulary scoring), from a
//! sample of data rows (symbol voting), or from a single symbol (pattern match).
//! Ties go to the market that comes first in registry order.

use crate::registry::{definitions, normalize_token};
use journal_core::config::ClassifierConfig;
use journal_core::{MarketType, RawRow};
use tracing::debug;

/// Scores and selects market types.
#[derive(Debug, Clone, Default)]
pub struct MarketClassifier {
    config: ClassifierConfig,
}

impl MarketClassifier {
    /// Create a classifier with the given weights and sample size.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Rows sampled by [`classify_from_sample`](Self::classify_from_sample) callers.
    pub fn sample_size(&self) -> usize {
        self.config.sample_size
    }

    /// Header score of every market, in registry order.
    ///
    /// Each identifier keyword found inside any header adds `keyword_weight`,
    /// each typical column term found inside any header adds `vocabulary_weight`.
    pub fn score_headers<S: AsRef<str>>(&self, headers: &[S]) -> Vec<(MarketType, u32)> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_token(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();
        let found = |term: &str| {
            let term = normalize_token(term);
            !term.is_empty() && normalized.iter().any(|h| h.contains(&term))
        };

        definitions()
            .iter()
            .map(|def| {
                let keywords = def
                    .identifier_keywords
                    .iter()
                    .filter(|k| found(k))
                    .count() as u32;
                let columns = def.typical_columns.iter().filter(|c| found(c)).count() as u32;
                let score =
                    keywords * self.config.keyword_weight + columns * self.config.vocabulary_weight;
                (def.market, score)
            })
            .collect()
    }

    /// Market with the strictly highest nonzero header score.
    pub fn classify_from_headers<S: AsRef<str>>(&self, headers: &[S]) -> Option<MarketType> {
        let scores = self.score_headers(headers);
        debug!(?scores, "header market scores");

        let mut best: Option<(MarketType, u32)> = None;
        for (market, score) in scores {
            if score == 0 {
                continue;
            }
            // Strictly greater keeps the earlier market on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((market, score));
            }
        }
        best.map(|(m, _)| m)
    }

    /// First market, in registry order, whose symbol patterns match.
    pub fn classify_from_symbol(&self, symbol: &str) -> Option<MarketType> {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return None;
        }
        definitions()
            .iter()
            .find(|def| def.matches_symbol(&symbol))
            .map(|def| def.market)
    }

    /// Plurality vote of symbol classification over the first `max_sample_size`
    /// rows, reading symbols from column `symbol_index`.
    pub fn classify_from_sample(
        &self,
        rows: &[RawRow],
        symbol_index: usize,
        max_sample_size: usize,
    ) -> Option<MarketType> {
        let mut votes = [0usize; MarketType::ALL.len()];

        for row in rows.iter().take(max_sample_size) {
            let Some(symbol) = row.get(symbol_index) else {
                continue;
            };
            if let Some(market) = self.classify_from_symbol(symbol) {
                if let Some(i) = MarketType::ALL.iter().position(|m| *m == market) {
                    votes[i] += 1;
                }
            }
        }
        debug!(?votes, "sample market votes");

        let mut best: Option<(usize, usize)> = None;
        for (i, &count) in votes.iter().enumerate() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((i, count));
            }
        }
        best.map(|(i, _)| MarketType::ALL[i])
    }
}
