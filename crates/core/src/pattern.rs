//! Name patterns for selecting fields and clouds
//!
//! A pattern is either a literal word or, when it contains regular
//! expression metacharacters, a regular expression that must match the
//! whole name.

use regex::Regex;
use thiserror::Error;

const REGEX_META: &[char] = &['.', '*', '+', '?', '[', ']', '(', ')', '{', '}', '|', '^', '$', '\\'];

/// Invalid pattern
#[derive(Debug, Error)]
#[error("Invalid name pattern '{pattern}': {source}")]
pub struct PatternError {
    /// Offending pattern text
    pub pattern: String,
    /// Regex compilation error
    #[source]
    pub source: regex::Error,
}

/// A literal name or an anchored regular expression
#[derive(Debug, Clone)]
pub enum NamePattern {
    /// Exact match
    Literal(String),
    /// Whole-name regular expression
    Regex(Regex),
}

impl NamePattern {
    /// Parse a pattern
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        if text.contains(REGEX_META) {
            let anchored = format!("^(?:{})$", text);
            Regex::new(&anchored)
                .map(NamePattern::Regex)
                .map_err(|source| PatternError {
                    pattern: text.to_string(),
                    source,
                })
        } else {
            Ok(NamePattern::Literal(text.to_string()))
        }
    }

    /// True if `name` matches
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Literal(lit) => lit == name,
            NamePattern::Regex(re) => re.is_match(name),
        }
    }
}

/// Requested/ignored pattern lists for one entity kind
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    requested: Vec<NamePattern>,
    ignored: Vec<NamePattern>,
}

impl NameFilter {
    /// Build from pattern texts
    pub fn new<S: AsRef<str>>(requested: &[S], ignored: &[S]) -> Result<Self, PatternError> {
        let parse_all = |list: &[S]| -> Result<Vec<NamePattern>, PatternError> {
            list.iter().map(|s| NamePattern::parse(s.as_ref())).collect()
        };
        Ok(NameFilter {
            requested: parse_all(requested)?,
            ignored: parse_all(ignored)?,
        })
    }

    /// True if any requested pattern matches
    pub fn is_requested(&self, name: &str) -> bool {
        self.requested.iter().any(|p| p.matches(name))
    }

    /// True if any ignored pattern matches
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|p| p.matches(name))
    }

    /// True if no patterns were requested
    pub fn has_requests(&self) -> bool {
        !self.requested.is_empty()
    }

    /// Decide whether to accept `name`
    ///
    /// With `implicit` set (auto-write in effect for the entity) a name is
    /// accepted unless ignored; otherwise it must also be requested.
    pub fn accepts(&self, name: &str, implicit: bool) -> bool {
        (implicit || self.is_requested(name)) && !self.is_ignored(name)
    }
}
