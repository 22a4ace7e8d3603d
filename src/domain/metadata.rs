use crate::domain::Version;

/// Computed outcome of one release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIntent {
    pub current_version: Version,
    pub new_version: Version,
    pub is_pre_release: bool,
}

impl ReleaseIntent {
    pub fn new(current_version: Version, new_version: Version) -> Self {
        let is_pre_release = new_version.is_pre_release();
        ReleaseIntent {
            current_version,
            new_version,
            is_pre_release,
        }
    }
}

/// Identity of the project being released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// `slug` when the manifest declares one, `name` otherwise
    pub name_or_slug: String,
    pub is_monorepo: bool,
}

/// Names written into git and the hosted release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetadata {
    pub tag_name: String,
    pub release_name: String,
    pub commit_message: String,
}

impl RepoMetadata {
    /// Derive tag, release name and commit message.
    ///
    /// Single project: `v1.2.3`. Monorepo workspace: `my-pkg@v1.2.3`.
    /// The commit message is `<commit_prefix>: <release_name>`.
    pub fn build(intent: &ReleaseIntent, project: &ProjectIdentity, commit_prefix: &str) -> Self {
        let tag_name = if project.is_monorepo {
            format!("{}@v{}", project.name_or_slug, intent.new_version)
        } else {
            format!("v{}", intent.new_version)
        };
        let release_name = tag_name.clone();
        let commit_message = format!("{}: {}", commit_prefix, release_name);

        RepoMetadata {
            tag_name,
            release_name,
            commit_message,
        }
    }
}
