//! Context hints and name variations used during disambiguation.

use crate::cache::normalize_name;
use crate::types::canonical_metric;

/// Positions that typically produce a metric, per sport.
const METRIC_POSITIONS: &[(&str, &str, &[&str])] = &[
    // Football
    ("NFL", "passing_yards", &["QB"]),
    ("NFL", "passing_touchdowns", &["QB"]),
    ("NFL", "completions", &["QB"]),
    ("NFL", "pass_attempts", &["QB"]),
    ("NFL", "quarterback_rating", &["QB"]),
    ("NFL", "rushing_yards", &["RB", "QB", "FB", "WR"]),
    ("NFL", "rushing_touchdowns", &["RB", "QB", "FB", "WR"]),
    ("NFL", "carries", &["RB", "QB", "FB"]),
    ("NFL", "receiving_yards", &["WR", "TE", "RB", "FB"]),
    ("NFL", "receptions", &["WR", "TE", "RB", "FB"]),
    ("NFL", "receiving_touchdowns", &["WR", "TE", "RB", "FB"]),
    ("NFL", "targets", &["WR", "TE", "RB"]),
    ("NFL", "sacks", &["DE", "DT", "LB", "OLB", "ILB", "MLB", "EDGE", "DL"]),
    ("NFL", "tackles", &["LB", "DE", "DT", "S", "CB", "MLB", "OLB", "ILB", "DL", "DB"]),
    ("NFL", "interceptions", &["CB", "S", "LB", "DB"]),
    ("NFL", "forced_fumbles", &["LB", "DE", "DT", "CB", "S", "DB"]),
    ("NFL", "pass_deflections", &["CB", "S", "LB", "DB"]),
    ("NFL", "field_goals_made", &["K"]),
    ("NFL", "extra_points_made", &["K"]),
    ("NFL", "punting_yards", &["P"]),
    // Basketball
    ("NBA", "rebounds", &["PF", "C", "SF", "F"]),
    ("NBA", "assists", &["PG", "SG", "G"]),
    ("NBA", "steals", &["PG", "SG", "SF", "G", "F"]),
    ("NBA", "blocks", &["C", "PF", "SF", "F"]),
    // Baseball
    ("MLB", "batting_average", &["1B", "2B", "3B", "SS", "LF", "CF", "RF", "C", "DH", "OF", "IF"]),
    ("MLB", "home_runs", &["1B", "2B", "3B", "SS", "LF", "CF", "RF", "C", "DH", "OF", "IF"]),
    ("MLB", "rbis", &["1B", "2B", "3B", "SS", "LF", "CF", "RF", "C", "DH", "OF", "IF"]),
    ("MLB", "earned_run_average", &["SP", "RP", "CP", "P"]),
    ("MLB", "strikeouts", &["SP", "RP", "CP", "P"]),
    ("MLB", "saves", &["CP", "RP", "P"]),
    // Hockey
    ("NHL", "goals", &["C", "LW", "RW", "F", "D"]),
    ("NHL", "save_percentage", &["G"]),
    ("NHL", "goals_against_average", &["G"]),
];

/// Name suffixes dropped when generating variations.
const SUFFIXES: &[&str] = &["jr.", "jr", "sr.", "sr", "ii", "iii", "iv", "v"];

/// Nicknames and their normalized full names. An alias may stand for
/// players in different sports; the per-sport index picks the right one.
const ALIASES: &[(&str, &[&str])] = &[
    ("ad", &["anthony davis"]),
    ("cmc", &["christian mccaffrey"]),
    ("cp3", &["chris paul"]),
    ("greek freak", &["giannis antetokounmpo"]),
    ("kd", &["kevin durant"]),
    ("king james", &["lebron james"]),
    ("lbj", &["lebron james"]),
    ("lj", &["lamar jackson", "lebron james"]),
    ("mj", &["michael jordan"]),
    ("obj", &["odell beckham jr."]),
    ("pg13", &["paul george"]),
    ("tb12", &["tom brady"]),
];

/// Positions implied by the requested metrics for `sport`.
///
/// Returns an empty list when no metric narrows the position.
pub fn positions_for_metrics(sport: &str, metrics: &[String]) -> Vec<&'static str> {
    let sport = sport.trim().to_uppercase();
    let mut positions: Vec<&'static str> = Vec::new();
    for metric in metrics {
        let metric = canonical_metric(metric);
        for (s, m, ps) in METRIC_POSITIONS {
            if *s == sport && *m == metric {
                for p in *ps {
                    if !positions.contains(p) {
                        positions.push(*p);
                    }
                }
            }
        }
    }
    positions
}

/// Normalized spellings under which a name may be indexed.
///
/// Always contains the normalized name itself, first. Adds the name without
/// a generational suffix ("odell beckham jr." → "odell beckham"), without a
/// middle initial ("lamar j. jackson" → "lamar jackson") and with dotted
/// initials collapsed ("t.j. watt" → "tj watt").
pub fn name_variations(name: &str) -> Vec<String> {
    let base = normalize_name(name);
    let mut variations: Vec<String> = Vec::new();
    let mut push = |v: String| {
        if !v.is_empty() && !variations.contains(&v) {
            variations.push(v);
        }
    };

    let stems: Vec<String> = std::iter::once(base.clone())
        .chain(without_suffix(&base))
        .collect();
    for stem in stems {
        if let Some(short) = without_middle_initial(&stem) {
            push(stem.clone());
            push(undotted(&short));
            push(short);
        } else {
            push(stem.clone());
        }
        if stem.contains('.') {
            push(undotted(&stem));
        }
    }

    variations
}

/// First-initial spellings of a name ("josh allen" → "j. allen", "j allen").
///
/// Kept apart from [`name_variations`]: an initial fits many players, so
/// these forms only ever match a query that is itself abbreviated.
pub fn initial_forms(name: &str) -> Vec<String> {
    let base = normalize_name(name);
    let mut forms: Vec<String> = Vec::new();
    for stem in std::iter::once(base.clone()).chain(without_suffix(&base)) {
        let words: Vec<&str> = stem.split(' ').collect();
        let [first, rest @ ..] = words.as_slice() else {
            continue;
        };
        if rest.is_empty() || first.contains('.') || is_initial(first) {
            continue;
        }
        let Some(initial) = first.chars().next() else {
            continue;
        };
        let rest = rest.join(" ");
        for form in [format!("{initial}. {rest}"), format!("{initial} {rest}")] {
            if !forms.contains(&form) {
                forms.push(form);
            }
        }
    }
    forms
}

/// Full names a nickname stands for; empty for anything else.
pub fn alias_targets(name: &str) -> &'static [&'static str] {
    let name = normalize_name(name);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, targets)| *targets)
        .unwrap_or_default()
}

/// Spellings a query is compared against index names with: its own
/// variations plus those of every full name it is an alias for.
pub fn query_variations(query: &str) -> Vec<String> {
    let mut variations = name_variations(query);
    for target in alias_targets(query) {
        for v in name_variations(target) {
            if !variations.contains(&v) {
                variations.push(v);
            }
        }
    }
    variations
}

fn without_suffix(name: &str) -> Option<String> {
    let words: Vec<&str> = name.split(' ').collect();
    (words.len() > 2 && words.last().is_some_and(|w| SUFFIXES.contains(w)))
        .then(|| words[..words.len() - 1].join(" "))
}

fn without_middle_initial(name: &str) -> Option<String> {
    match name.split(' ').collect::<Vec<_>>().as_slice() {
        [first, middle, last] if is_initial(middle) && !is_initial(first) => {
            Some(format!("{first} {last}"))
        }
        _ => None,
    }
}

fn is_initial(word: &str) -> bool {
    let mut chars = word.trim_end_matches('.').chars();
    chars.next().is_some_and(char::is_alphabetic) && chars.next().is_none()
}

fn undotted(name: &str) -> String {
    normalize_name(&name.replace('.', ""))
}

/// Whether a team hint refers to `team_id`.
///
/// Matches ids case-insensitively; short hints (abbreviations of up to
/// three letters) may also match inside a longer id.
pub fn team_matches(hint: &str, team_id: &str) -> bool {
    let hint = hint.trim().to_uppercase();
    let team = team_id.trim().to_uppercase();
    if hint.is_empty() || team.is_empty() {
        return false;
    }
    hint == team
        || (hint.len() <= 3 && team.contains(&hint))
        || (team.len() <= 3 && hint.contains(&team))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sacks_imply_pass_rushers() {
        let positions = positions_for_metrics("nfl", &["Sacks".to_string()]);
        assert!(positions.contains(&"DE"));
        assert!(!positions.contains(&"QB"));
    }

    #[test]
    fn receiving_metrics_imply_receivers() {
        let positions = positions_for_metrics("NFL", &["receiving yards".to_string()]);
        assert_eq!(positions, vec!["WR", "TE", "RB", "FB"]);
    }

    #[test]
    fn unknown_metric_implies_nothing() {
        assert!(positions_for_metrics("NFL", &["vibes".to_string()]).is_empty());
        assert!(positions_for_metrics("XFL", &["sacks".to_string()]).is_empty());
    }

    #[test]
    fn variations_strip_suffix_and_dots() {
        let v = name_variations("Odell Beckham Jr.");
        assert_eq!(v[0], "odell beckham jr.");
        assert!(v.contains(&"odell beckham".to_string()));

        let v = name_variations("T.J. Watt");
        assert!(v.contains(&"tj watt".to_string()));
    }

    #[test]
    fn two_word_names_keep_their_last_word() {
        let v = name_variations("Tom Jr");
        assert_eq!(v, vec!["tom jr".to_string()]);
    }

    #[test]
    fn variations_drop_middle_initial() {
        let v = name_variations("Lamar J. Jackson");
        assert_eq!(v[0], "lamar j. jackson");
        assert!(v.contains(&"lamar jackson".to_string()));
        assert!(v.contains(&"lamar j jackson".to_string()));

        let v = name_variations("Lamar J Jackson");
        assert!(v.contains(&"lamar jackson".to_string()));
        // a leading initial is a first name, not a middle one
        assert!(!name_variations("J. K. Dobbins").contains(&"j. dobbins".to_string()));
    }

    #[test]
    fn initial_forms_abbreviate_the_first_name() {
        assert_eq!(initial_forms("Josh Allen"), vec!["j. allen", "j allen"]);
        let forms = initial_forms("Odell Beckham Jr.");
        assert!(forms.contains(&"o. beckham jr.".to_string()));
        assert!(forms.contains(&"o. beckham".to_string()));
        assert!(initial_forms("T.J. Watt").is_empty());
        assert!(initial_forms("Pele").is_empty());
    }

    #[test]
    fn initial_forms_are_not_plain_variations() {
        assert!(!name_variations("Josh Allen").contains(&"j. allen".to_string()));
    }

    #[test]
    fn aliases_expand_to_full_names() {
        assert_eq!(alias_targets("KD"), &["kevin durant"]);
        assert_eq!(alias_targets(" cp3 "), &["chris paul"]);
        assert_eq!(alias_targets("LJ"), &["lamar jackson", "lebron james"]);
        assert!(alias_targets("Kevin Durant").is_empty());

        let v = query_variations("OBJ");
        assert_eq!(v[0], "obj");
        assert!(v.contains(&"odell beckham".to_string()));
    }

    #[test]
    fn team_hint_matching() {
        assert!(team_matches("dal", "DAL"));
        assert!(team_matches("DAL", "DALLAS"));
        assert!(!team_matches("NYG", "DAL"));
        assert!(!team_matches("", "DAL"));
    }
}
