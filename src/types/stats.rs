//! Stat lines and metric naming

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metric aliases, keyed by canonical-form input.
const METRIC_ALIASES: &[(&str, &str)] = &[
    ("qb_rating", "quarterback_rating"),
    ("passer_rating", "quarterback_rating"),
    ("field_goals", "field_goals_made"),
    ("fgs", "field_goals_made"),
    ("rbi", "rbis"),
    ("runs_batted_in", "rbis"),
    ("tds", "touchdowns"),
    ("total_touchdowns", "touchdowns"),
    ("passing_tds", "passing_touchdowns"),
    ("rushing_tds", "rushing_touchdowns"),
    ("receiving_tds", "receiving_touchdowns"),
    ("ints", "interceptions"),
    ("passing_yards_per_game", "yards_per_game"),
    ("catches", "receptions"),
    ("rebs", "rebounds"),
    ("pts", "points"),
];

const TOUCHDOWN_COMPONENTS: &[&str] = &[
    "passing_touchdowns",
    "rushing_touchdowns",
    "receiving_touchdowns",
];

const YARDS_PER_GAME_COMPONENTS: &[&str] = &["games_played", "passing_yards"];

/// Canonical metric name: lower-case, words joined by `_`, aliases folded.
///
/// `"Passing Yards"` and `"passing-yards"` both become `passing_yards`;
/// `"QB rating"` becomes `quarterback_rating`.
pub fn canonical_metric(metric: &str) -> String {
    let joined = metric
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    METRIC_ALIASES
        .iter()
        .find(|(alias, _)| *alias == joined)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(joined)
}

/// Stored metrics an upstream fetch must return to evaluate `metric`.
///
/// Derived metrics expand to their inputs; everything else is requested
/// as-is. The result is in canonical form.
pub fn metric_components(metric: &str) -> Vec<String> {
    let metric = canonical_metric(metric);
    match metric.as_str() {
        "touchdowns" => TOUCHDOWN_COMPONENTS.iter().map(|m| m.to_string()).collect(),
        "yards_per_game" => YARDS_PER_GAME_COMPONENTS
            .iter()
            .map(|m| m.to_string())
            .collect(),
        _ => vec![metric],
    }
}

/// Metric values for one player and season (e.g. `{"sacks": 12.5}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatLine(BTreeMap<String, f64>);

impl StatLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric (canonicalized) and return self.
    pub fn with(mut self, metric: &str, value: f64) -> Self {
        self.insert(metric, value);
        self
    }

    /// Insert or overwrite a metric (canonicalized).
    pub fn insert(&mut self, metric: &str, value: f64) {
        self.0.insert(canonical_metric(metric), value);
    }

    /// Raw stored value, without derivation.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(&canonical_metric(metric)).copied()
    }

    /// Value of `metric`, computing derived metrics from their components.
    ///
    /// A stored value always wins over derivation. `touchdowns` sums the
    /// touchdown components that are present; `yards_per_game` requires a
    /// positive `games_played`.
    pub fn value(&self, metric: &str) -> Option<f64> {
        let metric = canonical_metric(metric);
        if let Some(v) = self.0.get(&metric) {
            return Some(*v);
        }
        match metric.as_str() {
            "touchdowns" => {
                let parts: Vec<f64> = TOUCHDOWN_COMPONENTS
                    .iter()
                    .filter_map(|m| self.0.get(*m).copied())
                    .collect();
                (!parts.is_empty()).then(|| parts.iter().sum())
            }
            "yards_per_game" => {
                let games = self.0.get("games_played").copied()?;
                let yards = self.0.get("passing_yards").copied()?;
                (games > 0.0).then(|| yards / games)
            }
            _ => None,
        }
    }

    /// Keep only the named metrics (canonicalized).
    pub fn select(&self, metrics: &[String]) -> StatLine {
        let wanted: Vec<String> = metrics.iter().map(|m| canonical_metric(m)).collect();
        StatLine(
            self.0
                .iter()
                .filter(|(k, _)| wanted.contains(k))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for StatLine {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut line = StatLine::new();
        for (metric, value) in iter {
            line.insert(metric.as_ref(), value);
        }
        line
    }
}
