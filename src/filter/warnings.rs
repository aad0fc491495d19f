use super::lexer::{Lexer, TokenType};
use super::parser::{fold_case, split_segments, split_term};
use colored::Colorize;
use std::collections::HashSet;
use std::fmt;

/// A non-fatal problem found in a filter query
///
/// Parsing never fails; these describe terms that were silently dropped or
/// syntax that has no effect, so the user can spot typos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterWarning {
    /// A segment without '=' was skipped
    MissingEquals(String),
    /// A segment whose key was blank was skipped
    EmptyKey(String),
    /// A key appeared more than once; only the last value is kept
    DuplicateKey(String),
    /// Boolean operators or parentheses were found but are not evaluated
    UnsupportedOperator { token: String, position: usize },
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::MissingEquals(segment) => {
                write!(f, "Ignoring '{segment}': expected 'key=value'")
            }
            FilterWarning::EmptyKey(segment) => write!(f, "Ignoring '{segment}': empty key"),
            FilterWarning::DuplicateKey(key) => {
                write!(f, "Key '{key}' is given more than once; the last value wins")
            }
            FilterWarning::UnsupportedOperator { token, position } => write!(
                f,
                "'{token}' at position {position} is not evaluated; terms are combined with ',' only"
            ),
        }
    }
}

/// Collect warnings for a raw filter query
pub fn filter_warnings(raw: &str) -> Vec<FilterWarning> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for segment in split_segments(raw) {
        match split_term(segment) {
            None => warnings.push(FilterWarning::MissingEquals(segment.to_string())),
            Some(("", _)) => warnings.push(FilterWarning::EmptyKey(segment.to_string())),
            Some((key, _)) => {
                if !seen.insert(fold_case(key)) {
                    warnings.push(FilterWarning::DuplicateKey(key.to_string()));
                }
            }
        }
    }

    warnings.extend(
        Lexer::new(raw)
            .filter(|t| t.token_type.is_boolean_syntax())
            .map(|t| FilterWarning::UnsupportedOperator {
                token: t.value,
                position: t.position,
            }),
    );

    warnings
}

/// Print warnings for a raw filter query to stderr
pub fn print_filter_warnings(raw: &str) {
    for warning in filter_warnings(raw) {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
}
