use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered key/value pairs with case-insensitive, unique keys
///
/// Inserting a key that is already present (ignoring case) removes the
/// earlier entry and appends the new one, so the latest write wins on
/// value, casing and position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterMap {
    entries: Vec<(String, String)>,
}

/// Lowercase one character at a time
///
/// Unlike `str::to_lowercase` this ignores context (a final 'Σ' still
/// becomes 'σ'), so folding two strings never changes whether one contains
/// the other.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

fn same_key(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || fold_case(a) == fold_case(b)
}

impl FilterMap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a pair, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let replaced = self
            .entries
            .iter()
            .position(|(k, _)| same_key(k, &key))
            .map(|idx| self.entries.remove(idx).1);

        self.entries.push((key, value.into()));
        replaced
    }

    /// Look up a value, ignoring key case
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| same_key(k, key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for FilterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Split a raw query into trimmed, non-empty comma-separated segments
///
/// This is a flat split: commas inside quotes still separate segments.
pub fn split_segments(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Split a segment on its first '=' into a trimmed key and unquoted value
///
/// Returns `None` when the segment has no '='.
pub fn split_term(segment: &str) -> Option<(&str, &str)> {
    let (key, value) = segment.split_once('=')?;
    Some((key.trim(), strip_quotes(value.trim())))
}

/// Remove one layer of matching surrounding quotes
fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse a comma-separated list of `key=value` terms
///
/// Never fails. Segments without '=' or with an empty key are skipped, and
/// repeated keys overwrite earlier ones.
pub fn parse(raw: &str) -> FilterMap {
    let mut map = FilterMap::new();

    for segment in split_segments(raw) {
        let Some((key, value)) = split_term(segment) else {
            continue;
        };
        if !key.is_empty() {
            map.insert(key, value);
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_terms() {
        let map = parse("status=ok, region = eu-west ");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("status"), Some("ok"));
        assert_eq!(map.get("region"), Some("eu-west"));
    }

    #[test]
    fn test_last_write_wins_moves_entry_to_end() {
        let map = parse("a=1, b=2, A=3");
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("A", "3")]);
        assert_eq!(map.get("a"), Some("3"));
    }

    #[test]
    fn test_split_only_on_first_equals() {
        let map = parse("expr=a=b");
        assert_eq!(map.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'v'"), "v");
        assert_eq!(strip_quotes("\"v\""), "v");
        assert_eq!(strip_quotes("'v\""), "'v\"");
        assert_eq!(strip_quotes("\""), "\"");
        assert_eq!(strip_quotes("''"), "");
        assert_eq!(strip_quotes("\"'v'\""), "'v'");
    }

    #[test]
    fn test_segments_without_key_or_equals_are_dropped() {
        let map = parse("noequals, =value, , x=");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x"), Some(""));
    }

    #[test]
    fn test_insert_reports_replaced_value() {
        let mut map = FilterMap::new();
        assert_eq!(map.insert("Key", "1"), None);
        assert_eq!(map.insert("KEY", "2"), Some("1".to_string()));
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("key"));
    }

    #[test]
    fn test_fold_case_ignores_context() {
        assert_eq!(fold_case("AΣ"), "aσ");
        assert_eq!("AΣ".to_lowercase(), "aς");
        assert_eq!(parse("Σ=1, σ=2").get("Σ"), Some("2"));
    }

    #[test]
    fn test_serialize_preserves_order() {
        let map: FilterMap = [("z", "1"), ("a", "2")].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }
}
