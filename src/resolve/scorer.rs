//! Pluggable name similarity.
//!
//! The resolver only ever asks "how similar are these two normalized
//! names?"; which algorithm answers is chosen at construction time.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::StatlineError;

/// Similarity strategy. Scores are in `[0, 1]`, 1 meaning identical.
pub trait NameScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaro-Winkler similarity; rewards shared prefixes, forgiving of typos
/// near the end of a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerScorer;

impl NameScorer for JaroWinklerScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

/// Normalized Levenshtein similarity (`1 - distance / max_len`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinScorer;

impl NameScorer for LevenshteinScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Jaccard overlap of whitespace-separated tokens; order-insensitive,
/// so "allen josh" matches "josh allen" exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenJaccardScorer;

impl NameScorer for TokenJaccardScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        let ta: BTreeSet<&str> = a.split_whitespace().collect();
        let tb: BTreeSet<&str> = b.split_whitespace().collect();
        if ta.is_empty() && tb.is_empty() {
            return 1.0;
        }
        let inter = ta.intersection(&tb).count();
        let union = ta.union(&tb).count();
        inter as f64 / union as f64
    }
}

/// Named scorer selection for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    JaroWinkler,
    Levenshtein,
    TokenJaccard,
}

impl ScorerKind {
    pub fn build(self) -> Arc<dyn NameScorer> {
        match self {
            ScorerKind::JaroWinkler => Arc::new(JaroWinklerScorer),
            ScorerKind::Levenshtein => Arc::new(LevenshteinScorer),
            ScorerKind::TokenJaccard => Arc::new(TokenJaccardScorer),
        }
    }
}

impl FromStr for ScorerKind {
    type Err = StatlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "jaro_winkler" => Ok(ScorerKind::JaroWinkler),
            "levenshtein" => Ok(ScorerKind::Levenshtein),
            "token_jaccard" => Ok(ScorerKind::TokenJaccard),
            other => Err(StatlineError::Configuration(format!(
                "unknown name scorer '{other}'"
            ))),
        }
    }
}
