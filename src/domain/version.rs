use crate::domain::{Action, PreRelease};
use crate::error::{CosmodromeError, Result};
use std::fmt;
use std::str::FromStr;

/// Semantic version with an optional `-<tag>.<number>` pre-release suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreRelease>,
}

impl Version {
    /// Create a new stable version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    /// Attach a pre-release suffix
    pub fn with_pre_release(mut self, pre_release: PreRelease) -> Self {
        self.pre_release = Some(pre_release);
        self
    }

    /// Parse `M.m.p` or `M.m.p-tag.n`.
    ///
    /// The stable portion (everything before the first `-`) must split into
    /// exactly three unsigned integers. A malformed pre-release suffix is
    /// tolerated and dropped (see [`PreRelease::parse`]).
    pub fn parse(version: &str) -> Result<Self> {
        let (stable, suffix) = match version.split_once('-') {
            Some((stable, suffix)) => (stable, Some(suffix)),
            None => (version, None),
        };

        let parts: Vec<&str> = stable.split('.').collect();
        if parts.len() != 3 {
            return Err(CosmodromeError::malformed(
                version,
                "expected three dot-separated components (M.m.p)",
            ));
        }

        let component = |name: &str, raw: &str| {
            let invalid = || {
                CosmodromeError::malformed(version, format!("invalid {} component '{}'", name, raw))
            };
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            raw.parse::<u64>().map_err(|_| invalid())
        };

        Ok(Version {
            major: component("major", parts[0])?,
            minor: component("minor", parts[1])?,
            patch: component("patch", parts[2])?,
            pre_release: suffix.and_then(PreRelease::parse),
        })
    }

    /// The version without its pre-release suffix
    pub fn stable(&self) -> Self {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Apply `action` to this version.
    ///
    /// | action        | result                                      |
    /// |---------------|---------------------------------------------|
    /// | `major`       | `(M+1).0.0`, `-tag.1` iff `produce_pre_release` |
    /// | `minor`       | `M.(m+1).0`, same suffix rule               |
    /// | `patch`       | `M.m.(p+1)`, same suffix rule               |
    /// | `pre-release` | `M.m.p-tag.(n+1)`                           |
    /// | `promote`     | `M.m.p`                                     |
    ///
    /// `pre-release` needs an existing counter; without one the transition
    /// is rejected with [`CosmodromeError::IllegalTransition`].
    pub fn transition(
        &self,
        action: Action,
        pre_release_tag: &str,
        produce_pre_release: bool,
    ) -> Result<Self> {
        let overflow = || CosmodromeError::malformed(self.to_string(), "component overflow");
        let suffix = |v: Version| {
            if produce_pre_release {
                v.with_pre_release(PreRelease::first(pre_release_tag))
            } else {
                v
            }
        };

        match action {
            Action::Major => {
                let major = self.major.checked_add(1).ok_or_else(overflow)?;
                Ok(suffix(Version::new(major, 0, 0)))
            }
            Action::Minor => {
                let minor = self.minor.checked_add(1).ok_or_else(overflow)?;
                Ok(suffix(Version::new(self.major, minor, 0)))
            }
            Action::Patch => {
                let patch = self.patch.checked_add(1).ok_or_else(overflow)?;
                Ok(suffix(Version::new(self.major, self.minor, patch)))
            }
            Action::PreRelease => {
                let current = self.pre_release.as_ref().ok_or_else(|| {
                    CosmodromeError::IllegalTransition {
                        action: action.to_string(),
                        version: self.to_string(),
                        reason: "version has no pre-release counter to increment".to_string(),
                    }
                })?;
                let next = current.next(pre_release_tag).ok_or_else(overflow)?;
                Ok(self.stable().with_pre_release(next))
            }
            Action::Promote => Ok(self.stable()),
        }
    }
}

impl FromStr for Version {
    type Err = CosmodromeError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre_release) = &self.pre_release {
            write!(f, "-{}", pre_release)?;
        }
        Ok(())
    }
}

/// Compute the next version from a raw version string.
///
/// Fails with [`CosmodromeError::MalformedVersion`] when the stable portion
/// is not three numeric components, whatever the action.
///
/// # Example
/// ```ignore
/// let next = compute_new_version("1.2.3", Action::Major, "alpha", true)?;
/// assert_eq!(next.to_string(), "2.0.0-alpha.1");
/// ```
pub fn compute_new_version(
    version: &str,
    action: Action,
    pre_release_tag: &str,
    produce_pre_release: bool,
) -> Result<Version> {
    Version::parse(version)?.transition(action, pre_release_tag, produce_pre_release)
}
