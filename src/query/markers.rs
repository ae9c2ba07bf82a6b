//! Surface markers detected in question text.
//!
//! Matching works on lower-cased word tokens, so "vs." matches `vs` and
//! "Top" matches `top`, but "versatile" never matches `vs`.

use serde::{Deserialize, Serialize};

const COMPARISON_PHRASES: &[&str] = &[
    "vs",
    "versus",
    "compare",
    "compared to",
    "comparison",
    "who has more",
    "who had more",
    "who has the better",
    "better than",
    "head to head",
];

const RANKING_PHRASES: &[&str] = &[
    "lead", "leads", "led", "leader", "leaders", "leading", "best", "top", "most", "highest",
    "rank", "ranking", "ranked", "fewest", "lowest", "worst",
];

/// Ranking words that put the largest value first. Checked before
/// [`ASCENDING_PHRASES`], so "most" wins in a question that has both.
const DESCENDING_PHRASES: &[&str] = &["most", "highest", "best"];

/// Ranking words that put the smallest value first. "least" is handled
/// apart so "at least" stays a threshold.
const ASCENDING_PHRASES: &[&str] = &["fewest", "lowest", "worst"];

/// Phrases that put a bound on a metric, and which way the bound points.
/// The number follows the phrase.
const THRESHOLD_PREFIXES: &[(&str, Comparator)] = &[
    ("more than", Comparator::Gt),
    ("greater than", Comparator::Gt),
    ("over", Comparator::Gt),
    ("above", Comparator::Gt),
    ("at least", Comparator::Ge),
    ("fewer than", Comparator::Lt),
    ("less than", Comparator::Lt),
    ("under", Comparator::Lt),
    ("below", Comparator::Lt),
    ("at most", Comparator::Le),
    ("no more than", Comparator::Le),
];

/// Phrases that follow the number (`10 or more`).
const THRESHOLD_SUFFIXES: &[(&str, Comparator)] = &[
    ("or more", Comparator::Ge),
    ("or fewer", Comparator::Le),
    ("or less", Comparator::Le),
];

const POSITION_TERMS: &[(&str, &str)] = &[
    ("quarterback", "QB"),
    ("quarterbacks", "QB"),
    ("qbs", "QB"),
    ("running back", "RB"),
    ("running backs", "RB"),
    ("rbs", "RB"),
    ("wide receiver", "WR"),
    ("wide receivers", "WR"),
    ("receivers", "WR"),
    ("wrs", "WR"),
    ("tight end", "TE"),
    ("tight ends", "TE"),
    ("linebacker", "LB"),
    ("linebackers", "LB"),
    ("cornerback", "CB"),
    ("cornerbacks", "CB"),
    ("safety", "S"),
    ("safeties", "S"),
    ("defensive end", "DE"),
    ("defensive ends", "DE"),
    ("defensive tackle", "DT"),
    ("defensive tackles", "DT"),
    ("kicker", "K"),
    ("kickers", "K"),
    ("punter", "P"),
    ("punters", "P"),
    ("point guard", "PG"),
    ("point guards", "PG"),
    ("shooting guard", "SG"),
    ("shooting guards", "SG"),
    ("power forward", "PF"),
    ("power forwards", "PF"),
    ("small forward", "SF"),
    ("small forwards", "SF"),
    ("centers", "C"),
    ("pitchers", "P"),
    ("goalies", "G"),
    ("goaltenders", "G"),
];

/// Which end of a ranking comes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Largest value first.
    #[default]
    Descending,
    /// Smallest value first.
    Ascending,
}

/// Direction of a threshold bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    pub fn holds(&self, value: f64, bound: f64) -> bool {
        match self {
            Comparator::Gt => value > bound,
            Comparator::Ge => value >= bound,
            Comparator::Lt => value < bound,
            Comparator::Le => value <= bound,
        }
    }
}

/// A bound on a metric value ("10+ sacks", "at least 1000 yards").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub comparator: Comparator,
    pub value: f64,
}

impl Threshold {
    pub fn new(comparator: Comparator, value: f64) -> Self {
        Self { comparator, value }
    }

    /// Whether `value` satisfies the bound.
    pub fn admits(&self, value: f64) -> bool {
        self.comparator.holds(value, self.value)
    }
}

/// Everything [`scan`] found in a question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markers {
    pub comparison: bool,
    pub ranking: bool,
    pub order: SortOrder,
    pub threshold: Option<Threshold>,
    pub positions: Vec<String>,
    pub season: Option<String>,
    pub limit: Option<usize>,
}

/// Scan question text for markers.
pub fn scan(question: &str) -> Markers {
    let words = tokenize(question);
    Markers {
        comparison: COMPARISON_PHRASES.iter().any(|p| find(&words, p).is_some()),
        ranking: RANKING_PHRASES.iter().any(|p| find(&words, p).is_some()) || least(&words),
        order: order(&words),
        threshold: threshold(&words),
        positions: positions(&words),
        season: season(&words),
        limit: limit(&words),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '+')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Index of the first word of `phrase` in `words`.
fn find(words: &[String], phrase: &str) -> Option<usize> {
    let parts: Vec<&str> = phrase.split(' ').collect();
    words
        .windows(parts.len())
        .position(|w| w.iter().zip(&parts).all(|(a, b)| a == b))
}

fn number(word: &str) -> Option<f64> {
    word.trim_end_matches('+').replace(',', "").parse().ok()
}

fn threshold(words: &[String]) -> Option<Threshold> {
    // "10+" binds tightest
    if let Some(value) = words
        .iter()
        .filter(|w| w.ends_with('+'))
        .find_map(|w| number(w))
    {
        return Some(Threshold::new(Comparator::Ge, value));
    }

    // "no more than" must win over its "more than" suffix
    let mut prefixes: Vec<&(&str, Comparator)> = THRESHOLD_PREFIXES.iter().collect();
    prefixes.sort_by_key(|(p, _)| std::cmp::Reverse(p.len()));
    for (phrase, comparator) in prefixes {
        if let Some(at) = find(words, phrase) {
            let next = at + phrase.split(' ').count();
            if let Some(value) = words.get(next).and_then(|w| number(w)) {
                return Some(Threshold::new(*comparator, value));
            }
        }
    }

    for (phrase, comparator) in THRESHOLD_SUFFIXES {
        if let Some(at) = find(words, phrase)
            && at > 0
            && let Some(value) = number(&words[at - 1])
        {
            return Some(Threshold::new(*comparator, value));
        }
    }
    None
}

/// "least" on its own, not as part of "at least".
fn least(words: &[String]) -> bool {
    words
        .iter()
        .enumerate()
        .any(|(i, w)| w == "least" && (i == 0 || words[i - 1] != "at"))
}

fn order(words: &[String]) -> SortOrder {
    let any = |phrases: &[&str]| phrases.iter().any(|p| find(words, p).is_some());
    if any(DESCENDING_PHRASES) {
        SortOrder::Descending
    } else if any(ASCENDING_PHRASES) || least(words) {
        SortOrder::Ascending
    } else {
        SortOrder::Descending
    }
}

fn positions(words: &[String]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for (term, position) in POSITION_TERMS {
        if find(words, term).is_some() && !found.iter().any(|p| p == position) {
            found.push((*position).to_string());
        }
    }
    found
}

fn season(words: &[String]) -> Option<String> {
    words
        .iter()
        .find(|w| w.len() == 4 && w.parse::<u16>().is_ok_and(|y| (1900..=2100).contains(&y)))
        .cloned()
}

fn limit(words: &[String]) -> Option<usize> {
    let at = find(words, "top")?;
    words.get(at + 1)?.parse().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_markers_are_whole_words() {
        assert!(scan("Mahomes vs. Allen passing yards").comparison);
        assert!(scan("Compare Kelce and Andrews").comparison);
        assert!(scan("who has more sacks, Parsons or Watt?").comparison);
        assert!(!scan("a versatile linebacker").comparison);
    }

    #[test]
    fn ranking_markers() {
        assert!(scan("Who leads the league in sacks?").ranking);
        assert!(scan("top 10 rushers").ranking);
        assert!(!scan("Micah Parsons sacks").ranking);
    }

    #[test]
    fn sort_order_follows_the_ranking_word() {
        assert_eq!(scan("Who leads the league in sacks?").order, SortOrder::Descending);
        assert_eq!(scan("Who has the most sacks?").order, SortOrder::Descending);
        assert_eq!(
            scan("Who threw the fewest interceptions?").order,
            SortOrder::Ascending
        );
        assert_eq!(scan("lowest passer rating in 2023").order, SortOrder::Ascending);
        assert_eq!(scan("worst completion percentage").order, SortOrder::Ascending);
        assert_eq!(scan("Who fumbled the least?").order, SortOrder::Ascending);
        assert!(scan("Who fumbled the least?").ranking);
    }

    #[test]
    fn at_least_is_not_an_ascending_ranking() {
        let m = scan("players with at least 5 interceptions");
        assert_eq!(m.order, SortOrder::Descending);
        assert!(!m.ranking);
        assert_eq!(m.threshold, Some(Threshold::new(Comparator::Ge, 5.0)));
    }

    #[test]
    fn thresholds_in_every_spelling() {
        assert_eq!(scan("players with 10+ sacks").threshold, Some(Threshold::new(Comparator::Ge, 10.0)));
        assert_eq!(
            scan("more than 1,000 rushing yards").threshold,
            Some(Threshold::new(Comparator::Gt, 1000.0))
        );
        assert_eq!(scan("at least 5 interceptions").threshold, Some(Threshold::new(Comparator::Ge, 5.0)));
        assert_eq!(scan("fewer than 3 fumbles").threshold, Some(Threshold::new(Comparator::Lt, 3.0)));
        assert_eq!(scan("no more than 2 picks").threshold, Some(Threshold::new(Comparator::Le, 2.0)));
        assert_eq!(scan("12 or more sacks").threshold, Some(Threshold::new(Comparator::Ge, 12.0)));
        assert_eq!(scan("over the season").threshold, None);
    }

    #[test]
    fn position_terms_map_to_abbreviations() {
        assert_eq!(scan("Which quarterbacks threw the most?").positions, vec!["QB"]);
        assert_eq!(
            scan("best running backs and wide receivers").positions,
            vec!["RB", "WR"]
        );
    }

    #[test]
    fn season_and_limit() {
        let m = scan("top 5 sack leaders in 2023");
        assert_eq!(m.season.as_deref(), Some("2023"));
        assert_eq!(m.limit, Some(5));
    }

    #[test]
    fn threshold_admits() {
        let t = Threshold::new(Comparator::Ge, 10.0);
        assert!(t.admits(10.0));
        assert!(!t.admits(9.5));
    }
}
