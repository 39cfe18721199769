//! Utility functions and helpers.
//!
//! Common functionality used across multiple Sprout crates.

pub mod path;

// Re-export commonly used utilities
pub use path::{find_upwards, find_upwards_any};
