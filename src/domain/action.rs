use crate::error::{CosmodromeError, Result};
use std::fmt;
use std::str::FromStr;

/// Version transition requested for a release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Major,
    Minor,
    Patch,
    /// Increment the counter of the current pre-release
    PreRelease,
    /// Strip the pre-release suffix
    Promote,
}

impl Action {
    /// Actions offered when the current version is stable
    pub const STABLE: [Action; 3] = [Action::Major, Action::Minor, Action::Patch];

    /// Actions offered when the current version is a pre-release
    pub const PRE_RELEASE: [Action; 2] = [Action::PreRelease, Action::Promote];

    /// Wire name of the action
    pub fn name(&self) -> &'static str {
        match self {
            Action::Major => "major",
            Action::Minor => "minor",
            Action::Patch => "patch",
            Action::PreRelease => "pre-release",
            Action::Promote => "promote",
        }
    }
}

impl FromStr for Action {
    type Err = CosmodromeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "major" => Ok(Action::Major),
            "minor" => Ok(Action::Minor),
            "patch" => Ok(Action::Patch),
            "pre-release" => Ok(Action::PreRelease),
            "promote" => Ok(Action::Promote),
            other => Err(CosmodromeError::IllegalTransition {
                action: other.to_string(),
                version: "-".to_string(),
                reason: "unknown action".to_string(),
            }),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::STABLE.iter().chain(Action::PRE_RELEASE.iter()) {
            assert_eq!(action.name().parse::<Action>().unwrap(), *action);
        }
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::PreRelease.to_string(), "pre-release");
    }

    #[test]
    fn test_action_parse_unknown() {
        assert!("prerelease".parse::<Action>().is_err());
        assert!("MAJOR".parse::<Action>().is_err());
    }
}
