//! Project manifest and workspace resolution
//!
//! The project is described by a `package.json`. A root manifest that
//! declares a `workspaces` array makes the repository a monorepo; one
//! workspace is then chosen per run and its own manifest is used.

use crate::domain::{ProjectIdentity, Version};
use crate::error::{CosmodromeError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the project manifest
pub const MANIFEST_FILE: &str = "package.json";

/// The fields of `package.json` the release cares about
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Overrides `name` in tag names
    #[serde(default)]
    pub slug: Option<String>,

    /// Only an array of paths/patterns marks a monorepo
    #[serde(default)]
    pub workspaces: Option<serde_json::Value>,
}

impl PackageManifest {
    /// Read the manifest in `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(CosmodromeError::ManifestNotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| CosmodromeError::manifest(format!("{}: {}", path.display(), e)))
    }

    /// Workspace entries when `workspaces` is an array.
    ///
    /// Other shapes (objects, strings) are not treated as a monorepo.
    pub fn workspace_patterns(&self) -> Result<Option<Vec<String>>> {
        let Some(serde_json::Value::Array(entries)) = &self.workspaces else {
            return Ok(None);
        };

        entries
            .iter()
            .map(|entry| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    CosmodromeError::manifest(format!(
                        "workspace entries must be strings, got {}",
                        entry
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// `slug` when set and non-empty, `name` otherwise
    pub fn name_or_slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .or(self.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Expand workspace entries into concrete workspace directories.
///
/// Entries with glob metacharacters are matched against directories under
/// `root` that contain a manifest; literal entries are kept as given.
pub fn expand_workspaces(root: &Path, patterns: &[String]) -> Result<Vec<String>> {
    let mut workspaces: Vec<String> = Vec::new();

    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            let literal = pattern.trim_end_matches('/').to_string();
            if !workspaces.contains(&literal) {
                workspaces.push(literal);
            }
            continue;
        }

        let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
        let full_pattern = Path::new(&escaped_root).join(pattern);
        let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            CosmodromeError::manifest(format!("invalid workspace pattern '{}': {}", pattern, e))
        })?;

        let mut matched: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_dir() && path.join(MANIFEST_FILE).is_file())
            .filter_map(|path| relative_path(root, &path))
            .collect();
        matched.sort();

        debug!(pattern = %pattern, matched = matched.len(), "expanded workspace pattern");
        for workspace in matched {
            if !workspaces.contains(&workspace) {
                workspaces.push(workspace);
            }
        }
    }

    if workspaces.is_empty() {
        return Err(CosmodromeError::manifest(
            "'workspaces' is declared but matches no workspace",
        ));
    }

    Ok(workspaces)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Where the release operates
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceContext {
    pub root_path: PathBuf,
    pub is_monorepo: bool,
    /// Path of the active workspace relative to the root, `.` for a single project
    pub active_workspace_path: String,
    /// Manifest of the active workspace
    pub manifest: PackageManifest,
}

impl WorkspaceContext {
    /// Load the root manifest and, for a monorepo, the manifest of the
    /// workspace returned by `choose_workspace`.
    pub fn resolve<F>(root: &Path, choose_workspace: F) -> Result<Self>
    where
        F: FnOnce(&[String]) -> Result<String>,
    {
        let root_manifest = PackageManifest::load(root)?;

        let Some(patterns) = root_manifest.workspace_patterns()? else {
            return Ok(WorkspaceContext {
                root_path: root.to_path_buf(),
                is_monorepo: false,
                active_workspace_path: ".".to_string(),
                manifest: root_manifest,
            });
        };

        let workspaces = expand_workspaces(root, &patterns)?;
        let chosen = choose_workspace(&workspaces)?;
        let manifest = PackageManifest::load(&root.join(&chosen))?;

        Ok(WorkspaceContext {
            root_path: root.to_path_buf(),
            is_monorepo: true,
            active_workspace_path: chosen,
            manifest,
        })
    }

    /// Directory commands for the active workspace run in
    pub fn active_dir(&self) -> PathBuf {
        if self.active_workspace_path == "." {
            self.root_path.clone()
        } else {
            self.root_path.join(&self.active_workspace_path)
        }
    }

    /// Current version declared by the active manifest
    pub fn current_version(&self) -> Result<Version> {
        let raw = self.manifest.version.as_deref().ok_or_else(|| {
            CosmodromeError::manifest(format!(
                "{}/{} has no 'version' field",
                self.active_workspace_path, MANIFEST_FILE
            ))
        })?;

        Version::parse(raw)
    }

    /// Identity used in tag names
    pub fn identity(&self) -> Result<ProjectIdentity> {
        let name_or_slug = self.manifest.name_or_slug().ok_or_else(|| {
            CosmodromeError::manifest(format!(
                "{}/{} has neither 'name' nor 'slug'",
                self.active_workspace_path, MANIFEST_FILE
            ))
        })?;

        Ok(ProjectIdentity {
            name_or_slug: name_or_slug.to_string(),
            is_monorepo: self.is_monorepo,
        })
    }
}
