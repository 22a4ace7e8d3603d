//! Release state detection
//!
//! Classifies the current version as stable or pre-release and derives the
//! set of actions a release may take from it.

use crate::domain::{Action, Version};
use crate::error::{CosmodromeError, Result};
use regex::Regex;

/// Matcher for `M.m.p-<tag>.n` under a configured pre-release tag
#[derive(Debug, Clone)]
pub struct PreReleasePattern {
    tag: String,
    regex: Regex,
}

impl PreReleasePattern {
    /// Build the matcher for `tag`; the tag is matched literally
    pub fn new(tag: &str) -> Result<Self> {
        let pattern = format!(r"^\d+\.\d+\.\d+-{}\.\d+$", regex::escape(tag));
        let regex = Regex::new(&pattern)
            .map_err(|e| CosmodromeError::config(format!("invalid pre-release prefix: {}", e)))?;

        Ok(PreReleasePattern {
            tag: tag.to_string(),
            regex,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the rendered version is a pre-release under this tag
    pub fn matches(&self, version: &Version) -> bool {
        self.regex.is_match(&version.to_string())
    }
}

/// Outcome of state detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseState {
    pub is_pre_release: bool,
    pub allowed_actions: Vec<Action>,
}

impl ReleaseState {
    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions.contains(&action)
    }
}

/// Classify `version` against the configured pre-release tag.
///
/// A current pre-release may only move to `pre-release` or `promote`;
/// anything else may take `major`, `minor` or `patch`.
pub fn detect_state(version: &Version, pattern: &PreReleasePattern) -> ReleaseState {
    if pattern.matches(version) {
        ReleaseState {
            is_pre_release: true,
            allowed_actions: Action::PRE_RELEASE.to_vec(),
        }
    } else {
        ReleaseState {
            is_pre_release: false,
            allowed_actions: Action::STABLE.to_vec(),
        }
    }
}
