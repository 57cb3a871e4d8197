//! Error type for entry resolution.

use std::path::PathBuf;

/// Errors raised while resolving or reading patterns.
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    /// A pattern-list file does not exist.
    #[error("Pattern file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A pattern list (file or in-memory) has nothing actionable in it.
    #[error("No patterns in {origin}")]
    EmptyInput { origin: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}
