//! Pattern-list parsing.
//!
//! Plain text, one pattern per line. Blank lines and lines starting with `#`
//! are ignored. There is no quoting or escaping syntax.

use std::fs;
use std::path::Path;

use crate::FinderError;

/// Lines starting with this marker are comments.
pub const COMMENT_MARKER: char = '#';

/// Whether a pattern carries anything to resolve.
pub fn is_actionable(pattern: &str) -> bool {
    let trimmed = pattern.trim();
    !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
}

/// Read the actionable patterns from a list file, in file order.
///
/// Fails with [`FinderError::NotFound`] if the file is missing and with
/// [`FinderError::EmptyInput`] if only blanks and comments remain.
pub fn read_pattern_file(path: &Path) -> Result<Vec<String>, FinderError> {
    if !path.exists() {
        return Err(FinderError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path)?;
    let patterns: Vec<String> = contents
        .lines()
        .filter(|l| is_actionable(l))
        .map(|l| l.trim().to_string())
        .collect();

    if patterns.is_empty() {
        return Err(FinderError::EmptyInput {
            origin: path.display().to_string(),
        });
    }

    Ok(patterns)
}
