//! Layered configuration
//!
//! Three registries are consulted in priority order:
//! 1. Overrides (command-line flags)
//! 2. Defaults (project file: wpbundle.json or composer.json `extra.wpbundle`)
//! 3. Fallbacks (built-in values)

mod defaults;
pub mod dotpath;
mod file;
mod layered;
mod merge;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use defaults::BuiltinFallbacks;
pub use file::{read_document, write_document, Format};
pub use layered::{Binding, LayeredConfig, Registry, Scope, ValueKind};
pub use merge::{deep_merge, merge_layers};

/// Standalone project configuration file
pub const PROJECT_FILE: &str = "wpbundle.json";

/// Composer manifest; project configuration may live under [`COMPOSER_KEY`]
pub const COMPOSER_FILE: &str = "composer.json";

pub const COMPOSER_KEY: &str = "extra.wpbundle";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported configuration format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Key '{key}' not found in {}", path.display())]
    KeyNotFound { path: PathBuf, key: String },

    #[error("Configuration key not set: {0}")]
    MissingKey(String),

    #[error("Configuration key '{key}' must be {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Configuration key '{key}' is not an object")]
    NotAnObject { key: String },

    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("No file bound to the {0} registry")]
    Unbound(Registry),
}

/// Load project configuration from `root` into the defaults registry.
///
/// `wpbundle.json` wins over `composer.json`; the chosen file is bound so
/// `save_bound(Registry::Defaults, ..)` writes back to it. Returns the file
/// that was loaded, if any.
pub fn load_project(config: &mut LayeredConfig, root: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let project = root.join(PROJECT_FILE);
    if project.is_file() {
        config.load(&project, None, Registry::Defaults)?;
        config.bind(Registry::Defaults, &project, None);
        return Ok(Some(project));
    }

    let composer = root.join(COMPOSER_FILE);
    if composer.is_file() {
        match config.load(&composer, Some(COMPOSER_KEY), Registry::Defaults) {
            Ok(()) => {
                config.bind(Registry::Defaults, &composer, Some(COMPOSER_KEY));
                return Ok(Some(composer));
            }
            Err(ConfigError::KeyNotFound { .. }) => {
                tracing::debug!(path = %composer.display(), "no {} section", COMPOSER_KEY);
            }
            Err(e) => return Err(e),
        }
    }

    config.bind(Registry::Defaults, &project, None);
    Ok(None)
}
