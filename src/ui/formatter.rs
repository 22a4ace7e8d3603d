//! Progress reporting.
//!
//! The [Reporter] is the logger capability of a release run. Console output
//! is styled with `console`; diagnostics go through `tracing` separately.

use console::style;

use crate::boundary::ReleaseWarning;

/// User-facing progress of a release run
pub trait Reporter {
    /// A step has started
    fn pending(&self, message: &str);

    /// A step has finished
    fn complete(&self, message: &str);

    /// The whole run has finished
    fn success(&self, message: &str);

    /// Something the user should finish by hand
    fn warn(&self, warning: &ReleaseWarning);

    fn error(&self, message: &str);
}

/// Reporter printing to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        ConsoleReporter { quiet: false }
    }

    /// Only warnings and errors are printed
    pub fn quiet() -> Self {
        ConsoleReporter { quiet: true }
    }
}

impl Reporter for ConsoleReporter {
    fn pending(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("→").yellow(), message);
        }
    }

    fn complete(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("**").cyan().bold(), message);
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            println!("\n{} {}\n", style("✓").green().bold(), message);
        }
    }

    fn warn(&self, warning: &ReleaseWarning) {
        eprintln!("{} {}", style("⚠ WARNING:").yellow().bold(), warning);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", style("ERROR:").red().bold(), message);
    }
}
