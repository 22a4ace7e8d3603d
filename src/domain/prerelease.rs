//! Pre-release suffix handling
//!
//! A pre-release is the `-<tag>.<number>` tail of a version such as
//! `1.2.3-alpha.2`. The tag is the configured pre-release prefix, the number
//! is a counter starting at 1.

use std::fmt;

/// Pre-release suffix with its counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    /// The pre-release identifier (e.g. "alpha", "rc")
    pub tag: String,
    /// Counter, always >= 1
    pub number: u64,
}

impl PreRelease {
    /// Create a new pre-release
    pub fn new(tag: impl Into<String>, number: u64) -> Self {
        PreRelease {
            tag: tag.into(),
            number,
        }
    }

    /// First pre-release of a cycle: `<tag>.1`
    pub fn first(tag: impl Into<String>) -> Self {
        PreRelease::new(tag, 1)
    }

    /// Parse a `tag.number` suffix.
    ///
    /// Malformed suffixes are tolerated and yield `None`: a missing or
    /// non-numeric counter, a zero counter, or an empty tag.
    ///
    /// # Examples
    /// ```ignore
    /// assert_eq!(PreRelease::parse("alpha.2"), Some(PreRelease::new("alpha", 2)));
    /// assert_eq!(PreRelease::parse("alpha"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let (tag, number) = s.rsplit_once('.')?;
        if tag.is_empty() {
            return None;
        }

        let number = number.parse::<u64>().ok().filter(|n| *n >= 1)?;
        Some(PreRelease::new(tag, number))
    }

    /// Next counter under the given tag
    pub fn next(&self, tag: &str) -> Option<Self> {
        self.number
            .checked_add(1)
            .map(|number| PreRelease::new(tag, number))
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tag, self.number)
    }
}
