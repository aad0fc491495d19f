//! Filter query lexing, parsing and message matching
//!
//! A filter query selects messages whose text payload contains a set of
//! key/value pairs. Terms are separated by commas and all of them must match.
//!
//! # Syntax
//!
//! ```text
//! key=value            Require this pair in the message body
//! key='quoted value'   One layer of matching quotes is stripped
//! a=1, b=2             Both pairs are required
//! a=1, a=2             Last write wins: only a=2 is required
//! ```
//!
//! # Matching
//!
//! A pair is found in a body when any of these appear, ignoring case:
//!
//! ```text
//! key=value
//! "key" : value
//! 'key':'value'
//! "key":value
//! ```
//!
//! The lexer also recognizes `AND`, `OR`, `NULL` and parentheses. They are
//! reported as warnings and have no effect on matching.

pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod warnings;

pub use lexer::{Lexer, Token, TokenType, tokenize};
pub use matcher::{MATCH_PATTERNS, MatchPattern, explain, matches};
pub use parser::{FilterMap, fold_case, parse};
pub use warnings::{FilterWarning, filter_warnings, print_filter_warnings};

/// A parsed filter query, built once and applied to many message bodies
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    raw: String,
    required: FilterMap,
}

impl MessageFilter {
    /// Create a filter that matches every message
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a filter query; malformed terms are dropped
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            required: parse(raw),
        }
    }

    pub fn required(&self) -> &FilterMap {
        &self.required
    }

    /// Check if this filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn matches(&self, body: &str) -> bool {
        matches(body, &self.required)
    }

    /// Which pattern satisfied each required pair of `body`
    pub fn explain(&self, body: &str) -> Vec<(&str, Option<MatchPattern>)> {
        explain(body, &self.required)
    }

    /// Lex the raw query for diagnostics
    pub fn tokens(&self) -> Vec<Token> {
        tokenize(&self.raw)
    }
}
