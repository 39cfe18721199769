//! Terminal output formatting and utilities.
//!
//! Provides consistent output for every command: status lines, colors,
//! error messages and the count/trend formatting used in package rows.

pub mod colors;
pub mod errors;
pub mod format;

pub use errors::ErrorFormatter;
pub use format::{format_count, or_na, sparkline, truncate};

/// Prints package data to stdout and status lines to stderr, so that
/// `sprout search react | grep` only sees result rows
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    pub fn colors(&self) -> colors::ColorSupport {
        self.colors
    }

    /// Data line, printed as is
    pub fn line(&self, message: &str) {
        println!("{}", message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Status line led by an emoji
    pub fn step(&self, emoji: &str, message: &str) {
        eprintln!("{} {}", emoji, message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
