//! Utilities for path collection, size formatting and diagnostic text.

use crate::{PdfPressError, Result};
use std::path::PathBuf;

/// Longest diagnostic text retained from an underlying error, in characters.
pub const DIAGNOSTIC_LIMIT: usize = 100;

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`.
///
/// Returns a flattened list of resolved paths, pattern by pattern, in the
/// order the patterns were given.
///
/// Errors:
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let paths = collect_paths_for_pattern(pattern)?;
        resolved_paths.extend(paths);
    }

    Ok(resolved_paths)
}

/// Expand a single glob pattern into filesystem paths.
///
/// Pattern examples:
/// - `"**/*.pdf"`
/// - `"./scans/*.pdf"`
fn collect_paths_for_pattern<P: AsRef<str>>(pattern: P) -> Result<Vec<PathBuf>> {
    let mut resolved_paths = Vec::new();

    let paths = glob::glob(pattern.as_ref()).map_err(|err| PdfPressError::Other {
        message: format!("Invalid pattern '{}': {err}", pattern.as_ref()),
    })?;

    for entry in paths {
        let path = entry.map_err(|err| PdfPressError::Other {
            message: err.to_string(),
        })?;
        resolved_paths.push(path);
    }

    Ok(resolved_paths)
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Keep at most [`DIAGNOSTIC_LIMIT`] characters of `message`.
pub fn truncate_diagnostic(message: &str) -> String {
    let message = message.trim();
    match message.char_indices().nth(DIAGNOSTIC_LIMIT) {
        Some((cut, _)) => message[..cut].to_string(),
        None => message.to_string(),
    }
}
