use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for cosmodrome operations
#[derive(Error, Debug)]
pub enum CosmodromeError {
    #[error("Found local changes, please commit or stash them before releasing")]
    DirtyWorkingTree,

    #[error("Config file {} not found, run 'init' to scaffold it", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfigSchema(String),

    #[error("Configuration already exists at {} (use --force to overwrite)", .0.display())]
    ConfigAlreadyExists(PathBuf),

    #[error("Manifest {} not found", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Malformed version '{version}': {reason}")]
    MalformedVersion { version: String, reason: String },

    #[error("Cannot apply '{action}' to version {version}: {reason}")]
    IllegalTransition {
        action: String,
        version: String,
        reason: String,
    },

    #[error("Command `{command}` failed: {stderr}")]
    ProcessSpawnFailure { command: String, stderr: String },

    #[error("Missing '{0}' configuration inside the release config file")]
    MissingProviderConfig(String),

    #[error("Remote release creation failed{}: {message}", status_suffix(.status))]
    RemoteApiFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("HEAD is detached; check out a branch before releasing")]
    DetachedHead,

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

/// Convenience type alias for Results in cosmodrome
pub type Result<T> = std::result::Result<T, CosmodromeError>;

impl CosmodromeError {
    /// Create a config schema error with context
    pub fn config(msg: impl Into<String>) -> Self {
        CosmodromeError::InvalidConfigSchema(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        CosmodromeError::InvalidManifest(msg.into())
    }

    /// Create a malformed version error
    pub fn malformed(version: impl Into<String>, reason: impl Into<String>) -> Self {
        CosmodromeError::MalformedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a process failure carrying the captured stderr
    pub fn process(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        CosmodromeError::ProcessSpawnFailure {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a remote API failure
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        CosmodromeError::RemoteApiFailure {
            status,
            message: message.into(),
        }
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        CosmodromeError::Prompt(msg.into())
    }

    /// Whether the error is a validation failure raised before any side effect
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CosmodromeError::DirtyWorkingTree
                | CosmodromeError::ConfigNotFound(_)
                | CosmodromeError::InvalidConfigSchema(_)
                | CosmodromeError::MissingProviderConfig(_)
                | CosmodromeError::ManifestNotFound(_)
                | CosmodromeError::InvalidManifest(_)
        )
    }

    /// Process exit code the top-level handler uses for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CosmodromeError::ConfigNotFound(_)
            | CosmodromeError::InvalidConfigSchema(_)
            | CosmodromeError::ConfigAlreadyExists(_)
            | CosmodromeError::MissingProviderConfig(_) => exit_codes::CONFIG_ERROR,
            CosmodromeError::DirtyWorkingTree
            | CosmodromeError::DetachedHead
            | CosmodromeError::Git(_) => exit_codes::GIT_ERROR,
            CosmodromeError::MalformedVersion { .. }
            | CosmodromeError::IllegalTransition { .. } => exit_codes::VERSION_ERROR,
            CosmodromeError::ManifestNotFound(_) | CosmodromeError::InvalidManifest(_) => {
                exit_codes::VALIDATION_ERROR
            }
            CosmodromeError::RemoteApiFailure { .. } => exit_codes::REMOTE_ERROR,
            CosmodromeError::ProcessSpawnFailure { .. }
            | CosmodromeError::Prompt(_)
            | CosmodromeError::Io(_) => exit_codes::ERROR,
        }
    }
}

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const GIT_ERROR: i32 = 3;
    pub const VERSION_ERROR: i32 = 4;
    pub const VALIDATION_ERROR: i32 = 5;
    pub const REMOTE_ERROR: i32 = 6;
}
