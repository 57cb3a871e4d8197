//! wpbundle - production bundle assembler for WordPress plugins and themes
//!
//! Selects the files to ship with include/exclude patterns, copies them
//! into an output directory, installs production dependencies there and
//! optionally packages the result as an archive. Entry resolution lives in
//! the `wpbundle-finder` crate; this crate adds layered configuration and
//! the bundle pipeline.

pub mod bundle;
pub mod config;
pub mod exec;
pub mod logging;

pub use bundle::{Bundle, BundleError, BundleOptions, BundleReport};
pub use config::{ConfigError, LayeredConfig, Registry, Scope};
pub use wpbundle_finder::{EntrySet, FinderError, PathResolver};
