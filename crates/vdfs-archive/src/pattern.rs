//! Path patterns with `*` wildcards on the final segment
//!
//! A pattern is a directory scope followed by a name matcher:
//!
//! | Final segment | Matches names that                                    |
//! |---------------|-------------------------------------------------------|
//! | `TEXT`        | equal `TEXT`                                          |
//! | `*TEXT*`      | contain `TEXT`                                        |
//! | `*TEXT`       | contain `TEXT` ending at a token boundary             |
//! | `TEXT*`       | contain `TEXT` starting at a token boundary           |
//! | `*`           | anything                                              |
//!
//! A token boundary is the start or end of the name or any non-alphanumeric
//! character, so `*HUM_HEAD` matches `HUM_HEAD_V0.MDS` and `hum_head.tex`
//! but not `HUM_HEADGEAR.MDS`. All comparisons are case-insensitive.

use vdfs_formats::tree::names_equal;

use crate::path;
use crate::{ArchiveError, Result};

/// How the final pattern segment is compared with node names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatcher {
    /// Case-insensitive equality
    Exact(String),
    /// `*TEXT*`
    Contains(String),
    /// `*TEXT`
    EndsAtBoundary(String),
    /// `TEXT*`
    StartsAtBoundary(String),
    /// `*`
    Any,
}

impl NameMatcher {
    fn parse(token: &str) -> Option<Self> {
        let (leading, rest) = match token.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let (trailing, inner) = match rest.strip_suffix('*') {
            Some(inner) => (true, inner),
            None => (false, rest),
        };
        if inner.contains('*') {
            return None;
        }
        if inner.is_empty() {
            return Some(Self::Any);
        }

        let lowered = lowercase(inner);
        Some(match (leading, trailing) {
            (true, true) => Self::Contains(lowered),
            (true, false) => Self::EndsAtBoundary(lowered),
            (false, true) => Self::StartsAtBoundary(lowered),
            (false, false) => Self::Exact(inner.to_string()),
        })
    }

    /// Check whether a node name matches
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(text) => names_equal(name, text),
            Self::Contains(text) => lowercase(name).contains(text.as_str()),
            Self::EndsAtBoundary(text) => {
                let name = lowercase(name);
                occurrences(&name, text).any(|start| {
                    name[start + text.len()..]
                        .chars()
                        .next()
                        .is_none_or(is_boundary)
                })
            }
            Self::StartsAtBoundary(text) => {
                let name = lowercase(name);
                occurrences(&name, text)
                    .any(|start| name[..start].chars().next_back().is_none_or(is_boundary))
            }
        }
    }

    /// Check whether this matcher contains a wildcard
    pub const fn is_wildcard(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }
}

/// A parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    scope: Vec<String>,
    matcher: NameMatcher,
}

impl PathPattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str) -> Result<Self> {
        let segments = path::split(pattern);
        let Some((last, scope)) = segments.split_last() else {
            return Err(invalid(pattern, "pattern is empty"));
        };
        if scope.iter().any(|segment| segment.contains('*')) {
            return Err(invalid(
                pattern,
                "wildcards are only allowed in the final segment",
            ));
        }
        let matcher = NameMatcher::parse(last).ok_or_else(|| {
            invalid(
                pattern,
                "`*` is only supported at the start or end of a name",
            )
        })?;

        Ok(Self {
            scope: scope.iter().map(|s| (*s).to_string()).collect(),
            matcher,
        })
    }

    /// Directory segments preceding the final name
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Matcher for the final segment
    pub const fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Check whether the final segment contains a wildcard
    pub const fn is_wildcard(&self) -> bool {
        self.matcher.is_wildcard()
    }
}

fn lowercase(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

fn is_boundary(c: char) -> bool {
    !c.is_alphanumeric()
}

/// Byte offsets of every (possibly overlapping) occurrence of `needle`
fn occurrences<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    haystack
        .char_indices()
        .map(|(start, _)| start)
        .filter(move |&start| haystack[start..].starts_with(needle))
}

fn invalid(pattern: &str, reason: &'static str) -> ArchiveError {
    ArchiveError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    }
}
