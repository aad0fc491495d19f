use super::parser::{FilterMap, fold_case};

/// Textual encodings a key/value pair may take inside a message body
///
/// Patterns are tried in declaration order; the first hit satisfies a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPattern {
    /// `key=value`
    KeyEquals,
    /// `"key" : value`
    SpacedJson,
    /// `'key':'value'`
    SingleQuoted,
    /// `"key":value`, covering numbers and other unquoted JSON values
    CompactJson,
}

pub const MATCH_PATTERNS: [MatchPattern; 4] = [
    MatchPattern::KeyEquals,
    MatchPattern::SpacedJson,
    MatchPattern::SingleQuoted,
    MatchPattern::CompactJson,
];

impl MatchPattern {
    /// Render the literal text this pattern searches for
    pub fn render(&self, key: &str, value: &str) -> String {
        match self {
            MatchPattern::KeyEquals => format!("{key}={value}"),
            MatchPattern::SpacedJson => format!("\"{key}\" : {value}"),
            MatchPattern::SingleQuoted => format!("'{key}':'{value}'"),
            MatchPattern::CompactJson => format!("\"{key}\":{value}"),
        }
    }
}

/// Find the first pattern under which `key`/`value` occurs in a case-folded body
fn matching_pattern(folded_body: &str, key: &str, value: &str) -> Option<MatchPattern> {
    let key = fold_case(key);
    let value = fold_case(value);
    MATCH_PATTERNS
        .into_iter()
        .find(|pattern| folded_body.contains(&pattern.render(&key, &value)))
}

/// Check whether a message body contains every required pair
///
/// This is a case-insensitive substring search, not a JSON parse, so a
/// pattern occurring inside an unrelated string value still matches.
pub fn matches(body: &str, required: &FilterMap) -> bool {
    if required.is_empty() {
        return true;
    }
    if body.is_empty() {
        return false;
    }

    let folded = fold_case(body);
    required
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .all(|(key, value)| matching_pattern(&folded, key, value).is_some())
}

/// Report which pattern satisfied each required pair, in filter order
///
/// Pairs that are not satisfied map to `None`.
pub fn explain<'a>(body: &str, required: &'a FilterMap) -> Vec<(&'a str, Option<MatchPattern>)> {
    let folded = fold_case(body);
    required
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key, matching_pattern(&folded, key, value)))
        .collect()
}
