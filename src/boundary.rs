use std::fmt;

/// Non-fatal conditions met at the end of a release run.
/// The run still succeeds; these are reported so the user can finish by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseWarning {
    /// The release commit stayed local because push was declined
    CommitNotPushed { remote: String, branch: String },
    /// The hosted release was not created because the commit was not pushed
    ReleaseNotCreated { release_name: String },
    /// The chosen provider has no automated release creation
    UnsupportedProvider { provider: String, release_name: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::CommitNotPushed { remote, branch } => {
                write!(
                    f,
                    "Release commit was not pushed; run 'git push {} {}' when ready",
                    remote, branch
                )
            }
            ReleaseWarning::ReleaseNotCreated { release_name } => {
                write!(
                    f,
                    "Release {} was not created on GitHub because push was declined",
                    release_name
                )
            }
            ReleaseWarning::UnsupportedProvider {
                provider,
                release_name,
            } => {
                write!(
                    f,
                    "Automatic release creation is not available for {}; create release {} manually",
                    provider, release_name
                )
            }
        }
    }
}
