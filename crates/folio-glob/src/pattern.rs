//! Path-aware glob patterns with globstar support.

use thiserror::Error;

use crate::matcher::{contains_wildcards, match_segment};

/// Error raised when a pattern cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("invalid pattern: {0}")]
    Invalid(String),
}

/// One component of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A plain name, compared with string equality.
    Literal(String),
    /// A component containing `*`, `?`, or `[...]`.
    Wildcard(String),
    /// `**`, matching zero or more whole components.
    Globstar,
}

/// A glob pattern parsed into path components.
///
/// Patterns are split on `/`; each component is either a literal name, a
/// wildcard matched by [`match_segment`], or a globstar. Leading slashes and
/// empty components are ignored, so `/src//lib.rs` parses the same as
/// `src/lib.rs`.
///
/// ```
/// use folio_glob::PathPattern;
/// let p = PathPattern::parse("**/*.rs").unwrap();
/// assert!(p.matches("main.rs"));
/// assert!(p.matches("src/deep/main.rs"));
/// assert!(!p.matches("src/main.go"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments = Vec::new();
        for part in pattern.split('/') {
            if part.is_empty() {
                continue;
            }
            if part == "**" {
                // Consecutive globstars are redundant.
                if segments.last() != Some(&Segment::Globstar) {
                    segments.push(Segment::Globstar);
                }
            } else if contains_wildcards(part) {
                segments.push(Segment::Wildcard(part.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        if segments.is_empty() {
            return Err(PatternError::Invalid(format!(
                "no path components in {pattern:?}"
            )));
        }

        Ok(Self { segments })
    }

    /// The parsed segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True if the pattern contains a globstar.
    pub fn has_globstar(&self) -> bool {
        self.segments.contains(&Segment::Globstar)
    }

    /// Match a slash-separated path against the whole pattern.
    ///
    /// Leading slashes and empty components in the path are ignored, the
    /// same normalization applied when parsing.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        match_from(&self.segments, &parts)
    }
}

fn match_from(segments: &[Segment], parts: &[&str]) -> bool {
    match segments.first() {
        None => parts.is_empty(),
        Some(Segment::Globstar) => {
            // Try consuming 0..=parts.len() components.
            for skip in 0..=parts.len() {
                if match_from(&segments[1..], &parts[skip..]) {
                    return true;
                }
            }
            false
        }
        Some(seg) => {
            let Some(first) = parts.first() else {
                return false;
            };
            let hit = match seg {
                Segment::Literal(name) => name == first,
                Segment::Wildcard(pat) => match_segment(pat, first),
                Segment::Globstar => unreachable!(),
            };
            hit && match_from(&segments[1..], &parts[1..])
        }
    }
}
