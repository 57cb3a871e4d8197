//! Include/exclude precedence over resolved entries.
//!
//! Rules, applied per resolved key in call order:
//!
//! - Both sets are write-once per key.
//! - An exactly-excluded key can never be included again.
//! - Excluding an included key removes it from the inclusion set.
//! - Excluding a path nested inside an included directory leaves the
//!   directory included and appends the path to the removal list, to be
//!   deleted from the destination after the directory has been copied.

use std::path::{Path, PathBuf};

use crate::{is_actionable, is_sub_path, read_pattern_file, EntryMap, FinderError, PathResolver};

/// Inclusion set, exclusion set and removal list for one base directory.
#[derive(Debug, Clone)]
pub struct EntrySet {
    resolver: PathResolver,
    included: EntryMap,
    excluded: EntryMap,
    removals: Vec<String>,
}

impl EntrySet {
    pub fn new(base: impl AsRef<Path>) -> Result<Self, FinderError> {
        Ok(Self::with_resolver(PathResolver::new(base)?))
    }

    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self {
            resolver,
            included: EntryMap::new(),
            excluded: EntryMap::new(),
            removals: Vec::new(),
        }
    }

    pub fn base(&self) -> &Path {
        self.resolver.base()
    }

    /// Include every entry `pattern` resolves to.
    pub fn include(&mut self, pattern: &str) -> Result<(), FinderError> {
        for entry in self.resolver.resolve(pattern)? {
            if self.included.contains_key(&entry.relative) {
                continue;
            }
            if self.excluded.contains_key(&entry.relative) {
                tracing::debug!(path = %entry.relative, "already excluded, not including");
                continue;
            }
            tracing::debug!(path = %entry.relative, "include");
            self.included.insert(entry.relative, entry.absolute);
        }
        Ok(())
    }

    /// Exclude every entry `pattern` resolves to.
    pub fn exclude(&mut self, pattern: &str) -> Result<(), FinderError> {
        for entry in self.resolver.resolve(pattern)? {
            if self.excluded.contains_key(&entry.relative) {
                continue;
            }

            if self.included.remove(&entry.relative).is_some() {
                tracing::debug!(path = %entry.relative, "exclude");
            } else if self.is_inside_included(&entry.absolute)
                && !self.removals.contains(&entry.relative)
            {
                tracing::debug!(path = %entry.relative, "exclude from included directory");
                self.removals.push(entry.relative.clone());
            }

            self.excluded.insert(entry.relative, entry.absolute);
        }
        Ok(())
    }

    /// Include each pattern in order. Fails if none are actionable.
    pub fn include_many<I, S>(&mut self, patterns: I) -> Result<(), FinderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in actionable(patterns, "include list")? {
            self.include(&pattern)?;
        }
        Ok(())
    }

    /// Exclude each pattern in order. Fails if none are actionable.
    pub fn exclude_many<I, S>(&mut self, patterns: I) -> Result<(), FinderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in actionable(patterns, "exclude list")? {
            self.exclude(&pattern)?;
        }
        Ok(())
    }

    /// Include each pattern listed in `path`.
    ///
    /// A missing file is [`FinderError::NotFound`]; callers treating the
    /// file as optional must handle that themselves.
    pub fn include_from_file(&mut self, path: &Path) -> Result<(), FinderError> {
        for pattern in read_pattern_file(path)? {
            self.include(&pattern)?;
        }
        Ok(())
    }

    /// Exclude each pattern listed in `path`.
    pub fn exclude_from_file(&mut self, path: &Path) -> Result<(), FinderError> {
        for pattern in read_pattern_file(path)? {
            self.exclude(&pattern)?;
        }
        Ok(())
    }

    /// Entries to copy, in inclusion order.
    pub fn entries(&self) -> EntryMap {
        self.included.clone()
    }

    pub fn excluded(&self) -> &EntryMap {
        &self.excluded
    }

    /// Relative paths to delete after whole-directory copies.
    pub fn removal_list(&self) -> &[String] {
        &self.removals
    }

    /// Removal list mapped to absolute paths under `output`.
    ///
    /// These must be deleted only after every included entry was copied.
    pub fn entries_to_remove(&self, output: &Path) -> Vec<PathBuf> {
        self.removals
            .iter()
            .map(|relative| {
                let mut path = output.to_path_buf();
                path.extend(relative.split('/'));
                path
            })
            .collect()
    }

    fn is_inside_included(&self, absolute: &Path) -> bool {
        self.included
            .iter()
            .any(|included| is_sub_path(absolute, &included.absolute))
    }
}

fn actionable<I, S>(patterns: I, origin: &str) -> Result<Vec<String>, FinderError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let patterns: Vec<String> = patterns
        .into_iter()
        .filter(|p| is_actionable(p.as_ref()))
        .map(|p| p.as_ref().trim().to_string())
        .collect();

    if patterns.is_empty() {
        return Err(FinderError::EmptyInput {
            origin: origin.to_string(),
        });
    }
    Ok(patterns)
}
