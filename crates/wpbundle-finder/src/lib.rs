//! Include/exclude entry resolution for production bundles.
//!
//! Turns user patterns (literal paths, relative paths, glob expressions) into
//! an exact set of filesystem entries to copy, plus a list of nested paths to
//! delete after whole directories have been copied.
//!
//! Directories are atomic: the resolver never expands a directory into its
//! descendants. An exclusion that falls inside an included directory is
//! recorded on the removal list instead of splitting the directory up.

mod entries;
mod error;
mod map;
mod path;
mod patterns;

pub use entries::EntrySet;
pub use error::FinderError;
pub use map::{Entry, EntryMap};
pub use path::{is_sub_path, make_relative, normalize, PathResolver};
pub use patterns::{is_actionable, read_pattern_file, COMMENT_MARKER};
