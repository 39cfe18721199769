//! Path utilities for locating project files.
//!
//! Both manifest discovery and lockfile-based package manager detection walk
//! from a start directory up to the filesystem root.

use std::path::{Path, PathBuf};

/// Find `filename` in `start` or the nearest parent directory that has it.
///
/// Only regular files match; a directory with the same name is skipped.
pub fn find_upwards(start: &Path, filename: &str) -> Option<PathBuf> {
    find_upwards_any(start, &[filename]).map(|(path, _)| path)
}

/// Find the first of `filenames` present while walking up from `start`.
///
/// Candidates are checked in order at each level before moving to the
/// parent, so a closer directory always wins over a farther one. Returns
/// the path and the index of the matching candidate.
pub fn find_upwards_any(start: &Path, filenames: &[&str]) -> Option<(PathBuf, usize)> {
    for dir in start.ancestors() {
        for (index, filename) in filenames.iter().enumerate() {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Some((candidate, index));
            }
        }
    }
    None
}
