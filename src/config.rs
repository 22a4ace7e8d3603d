use crate::error::{CosmodromeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the release configuration
pub const CONFIG_FILE_NAME: &str = ".cosmodrome.json";

/// Default location of the release configuration file
pub const DEFAULT_CONFIG_PATH: &str = "./.cosmodrome.json";

/// Default API root for hosted releases
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Returns the default git remote used for pushes.
fn default_remote() -> String {
    "origin".to_string()
}

/// Returns the default GitHub API root.
fn default_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

/// Represents the complete release configuration (`.cosmodrome.json`).
///
/// Field names follow the camelCase keys of the JSON file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    /// Tag used for pre-releases, e.g. `alpha` in `1.0.0-alpha.1`
    pub pre_release_prefix: String,

    /// Prefix of the release commit message
    pub release_commit_prefix: String,

    pub git: GitConfig,

    /// Hosted-release credentials; only required when publishing to GitHub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,
}

/// Identity used for the release commit and the remote to push to.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    pub author_email: String,
    pub author_username: String,

    #[serde(default = "default_remote")]
    pub remote: String,
}

/// Credentials for creating GitHub releases.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,

    /// API root; override for GitHub Enterprise
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl ReleaseConfig {
    /// The template written by `init`: every value empty, `github` present.
    pub fn scaffold() -> Self {
        ReleaseConfig {
            pre_release_prefix: String::new(),
            release_commit_prefix: String::new(),
            git: GitConfig {
                author_email: String::new(),
                author_username: String::new(),
                remote: default_remote(),
            },
            github: Some(GitHubConfig {
                owner: String::new(),
                repo: String::new(),
                token: String::new(),
                api_url: default_api_url(),
            }),
        }
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ReleaseConfig =
            serde_json::from_str(content).map_err(|e| CosmodromeError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks beyond the JSON shape.
    pub fn validate(&self) -> Result<()> {
        if self.pre_release_prefix.is_empty() {
            return Err(CosmodromeError::config("'preReleasePrefix' must not be empty"));
        }

        if !self
            .pre_release_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(CosmodromeError::config(format!(
                "'preReleasePrefix' must contain only [0-9A-Za-z-], got '{}'",
                self.pre_release_prefix
            )));
        }

        if self.git.author_email.trim().is_empty() {
            return Err(CosmodromeError::config("'git.authorEmail' must not be empty"));
        }

        if self.git.author_username.trim().is_empty() {
            return Err(CosmodromeError::config(
                "'git.authorUsername' must not be empty",
            ));
        }

        if self.git.remote.trim().is_empty() {
            return Err(CosmodromeError::config("'git.remote' must not be empty"));
        }

        Ok(())
    }

    /// Render as pretty-printed JSON, as written by `init`
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CosmodromeError::config(e.to_string()))
    }
}

/// Loads the release configuration from `path`.
///
/// # Returns
/// * `Ok(ReleaseConfig)` - Parsed and validated configuration
/// * `Err(ConfigNotFound)` - If the file does not exist
/// * `Err(InvalidConfigSchema)` - If the file is not a valid configuration
pub fn load_config(path: &Path) -> Result<ReleaseConfig> {
    if !path.exists() {
        return Err(CosmodromeError::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    ReleaseConfig::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "preReleasePrefix": "alpha",
        "releaseCommitPrefix": "release",
        "git": { "authorEmail": "bot@example.com", "authorUsername": "release-bot" }
    }"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = ReleaseConfig::from_json(VALID).unwrap();
        assert_eq!(config.pre_release_prefix, "alpha");
        assert_eq!(config.release_commit_prefix, "release");
        assert_eq!(config.git.author_username, "release-bot");
        assert_eq!(config.git.remote, "origin");
        assert!(config.github.is_none());
    }

    #[test]
    fn test_parse_github_block() {
        let json = r#"{
            "preReleasePrefix": "rc",
            "releaseCommitPrefix": "chore",
            "git": { "authorEmail": "a@b.c", "authorUsername": "a" },
            "github": { "owner": "acme", "repo": "rocket", "token": "t0k" }
        }"#;
        let github = ReleaseConfig::from_json(json).unwrap().github.unwrap();
        assert_eq!(github.owner, "acme");
        assert_eq!(github.repo, "rocket");
        assert_eq!(github.api_url, DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn test_missing_field_is_schema_error() {
        let json = r#"{ "preReleasePrefix": "alpha", "releaseCommitPrefix": "r" }"#;
        let err = ReleaseConfig::from_json(json).unwrap_err();
        assert!(matches!(err, CosmodromeError::InvalidConfigSchema(_)));
        assert!(err.to_string().contains("git"));
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let json = r#"{
            "preReleasePrefix": 1,
            "releaseCommitPrefix": "r",
            "git": { "authorEmail": "a@b.c", "authorUsername": "a" }
        }"#;
        assert!(matches!(
            ReleaseConfig::from_json(json),
            Err(CosmodromeError::InvalidConfigSchema(_))
        ));
    }

    #[test]
    fn test_invalid_pre_release_prefix() {
        for prefix in ["", "al.pha", "beta 1", "rc!"] {
            let mut config = ReleaseConfig::from_json(VALID).unwrap();
            config.pre_release_prefix = prefix.to_string();
            assert!(config.validate().is_err(), "'{}' should be rejected", prefix);
        }
    }

    #[test]
    fn test_scaffold_needs_filling_in() {
        let scaffold = ReleaseConfig::scaffold();
        assert!(scaffold.github.is_some());
        assert!(scaffold.validate().is_err());
    }

    #[test]
    fn test_scaffold_json_keys() {
        let json = ReleaseConfig::scaffold().to_json_pretty().unwrap();
        for key in [
            "preReleasePrefix",
            "releaseCommitPrefix",
            "authorEmail",
            "authorUsername",
            "owner",
            "repo",
            "token",
        ] {
            assert!(json.contains(key), "scaffold is missing '{}'", key);
        }
    }

    #[test]
    fn test_load_config_not_found() {
        let err = load_config(Path::new("/nonexistent/.cosmodrome.json")).unwrap_err();
        assert!(matches!(err, CosmodromeError::ConfigNotFound(_)));
    }
}
