//! External command execution
//!
//! Commands are blocking: each one completes before the caller continues.
//! A non-zero exit becomes [`CosmodromeError::ProcessSpawnFailure`] carrying
//! the captured standard error verbatim.

use crate::error::{CosmodromeError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, instrument};

/// Runs external programs to completion
pub trait CommandRunner {
    /// Run `program` with `args` in `cwd` and return its standard output.
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<String>;
}

/// Runs commands on the host system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<String> {
        let command_line = render_command(program, args);

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| CosmodromeError::process(&command_line, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            debug!(
                command = %command_line,
                code = output.status.code().unwrap_or(-1),
                "command failed"
            );
            return Err(CosmodromeError::process(command_line, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Package manager operations on the active workspace
#[derive(Debug, Clone)]
pub struct PackageManager {
    program: String,
}

impl Default for PackageManager {
    fn default() -> Self {
        PackageManager::npm()
    }
}

impl PackageManager {
    pub fn npm() -> Self {
        PackageManager {
            program: "npm".to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Write `version` into the manifest in `dir`
    pub fn set_version(&self, runner: &dyn CommandRunner, dir: &Path, version: &str) -> Result<()> {
        let assignment = format!("version={}", version);
        runner.run(&self.program, &["pkg", "set", &assignment], dir)?;
        Ok(())
    }

    /// Refresh the lockfile after a manifest change
    pub fn refresh_lockfile(&self, runner: &dyn CommandRunner, dir: &Path) -> Result<()> {
        runner.run(&self.program, &["i"], dir)?;
        Ok(())
    }
}
