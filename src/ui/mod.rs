//! User interface module - interaction (prompts) and progress reporting.
//!
//! Separates concerns:
//! - `formatter` - The [Reporter] capability and its console rendering
//! - This module - The [Prompter] capability and its terminal implementation
//!
//! Both are handed to the release pipeline explicitly so tests can script
//! answers and capture output.

use dialoguer::{Confirm, Input, Select};

use crate::error::{CosmodromeError, Result};

pub mod formatter;

pub use formatter::{ConsoleReporter, Reporter};

/// Source of answers for the interactive parts of a release
pub trait Prompter {
    /// Choose one of `items`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Index of the chosen item
    fn select(&self, message: &str, items: &[String], default: usize) -> Result<usize>;

    /// Yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Free text, `default` when the user just presses Enter.
    fn input(&self, message: &str, default: &str) -> Result<String>;
}

/// Prompts on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select(&self, message: &str, items: &[String], default: usize) -> Result<usize> {
        Select::new()
            .with_prompt(message)
            .items(items)
            .default(default)
            .interact()
            .map_err(|e| CosmodromeError::prompt(e.to_string()))
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| CosmodromeError::prompt(e.to_string()))
    }

    fn input(&self, message: &str, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .default(default.to_string())
            .interact_text()
            .map_err(|e| CosmodromeError::prompt(e.to_string()))
    }
}
