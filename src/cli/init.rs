//! Scaffolding of the release configuration

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{ReleaseConfig, CONFIG_FILE_NAME};
use crate::error::{CosmodromeError, Result};
use crate::ui::Reporter;

const GITIGNORE_FILE: &str = ".gitignore";
const IGNORE_SECTION: &str = "# cosmodrome";

/// Write the scaffold configuration under `root` and keep it out of git.
///
/// Refuses to overwrite an existing configuration unless `force` is set.
pub fn run_init(root: &Path, force: bool, reporter: &dyn Reporter) -> Result<PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        return Err(CosmodromeError::ConfigAlreadyExists(config_path));
    }

    let mut content = ReleaseConfig::scaffold().to_json_pretty()?;
    content.push('\n');
    fs::write(&config_path, content)?;
    info!(path = %config_path.display(), "wrote scaffold configuration");
    reporter.complete(&format!("{} file was successfully created", CONFIG_FILE_NAME));

    if ensure_ignored(root, CONFIG_FILE_NAME)? {
        reporter.complete(&format!("added {} to {}", CONFIG_FILE_NAME, GITIGNORE_FILE));
    }

    Ok(config_path)
}

/// Append `entry` to the root ignore file unless it is already listed.
/// Returns whether the file changed.
fn ensure_ignored(root: &Path, entry: &str) -> Result<bool> {
    let path = root.join(GITIGNORE_FILE);
    let mut content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let rooted = format!("/{}", entry);
    if content
        .lines()
        .map(str::trim)
        .any(|line| line == entry || line == rooted)
    {
        return Ok(false);
    }

    if !content.is_empty() {
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
    }
    content.push_str(IGNORE_SECTION);
    content.push('\n');
    content.push_str(entry);
    content.push('\n');

    fs::write(&path, content)?;
    Ok(true)
}
