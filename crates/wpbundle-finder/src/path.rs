//! Pattern expansion and path utilities.
//!
//! A pattern is a literal path (absolute, or relative to the base directory)
//! or a glob expression. Existing paths resolve to exactly one entry, even
//! when they are directories. Globs are expanded against the filesystem and
//! every match (file or directory) becomes one entry; matched directories
//! are never descended into on their own account.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher};
use path_absolutize::Absolutize;
use walkdir::{DirEntry, WalkDir};

use crate::{is_actionable, EntryMap, FinderError};

/// Characters that turn a path segment into a glob expression.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expands patterns against a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `base`. A relative base is made absolute
    /// against the current directory.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, FinderError> {
        let base = base.as_ref().absolutize()?.into_owned();
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Make `path` absolute against the base directory, folding `.` and `..`.
    pub fn make_absolute(&self, path: impl AsRef<Path>) -> Result<PathBuf, FinderError> {
        Ok(path.as_ref().absolutize_from(&self.base)?.into_owned())
    }

    /// `/`-separated path of `path` relative to the base directory.
    pub fn make_relative(&self, path: &Path) -> String {
        make_relative(path, &self.base)
    }

    /// Expand one pattern into `relative -> absolute` entries.
    ///
    /// Blank and comment patterns, non-matching globs, and literal paths that
    /// do not exist all yield an empty map. The base directory itself is
    /// never an entry. A trailing `/` selects directories only.
    pub fn resolve(&self, pattern: &str) -> Result<EntryMap, FinderError> {
        let mut resolved = EntryMap::new();
        if !is_actionable(pattern) {
            return Ok(resolved);
        }

        let pattern = pattern.trim();
        let dirs_only = pattern.ends_with('/') || (cfg!(windows) && pattern.ends_with('\\'));
        let absolute = self.make_absolute(pattern)?;

        if absolute.is_dir() || (!dirs_only && absolute.is_file()) {
            self.push_entry(&mut resolved, absolute);
        } else if pattern.contains(GLOB_META) {
            self.expand_glob(pattern, &absolute, dirs_only, &mut resolved)?;
        }

        tracing::debug!(pattern, matches = resolved.len(), "resolved pattern");
        Ok(resolved)
    }

    /// Union of [`resolve`](Self::resolve) over `patterns`; the first pattern
    /// to produce a key keeps it.
    pub fn resolve_many<I, S>(&self, patterns: I) -> Result<EntryMap, FinderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut all = EntryMap::new();
        for pattern in patterns {
            all.extend(self.resolve(pattern.as_ref())?);
        }
        Ok(all)
    }

    fn push_entry(&self, resolved: &mut EntryMap, absolute: PathBuf) {
        if absolute == self.base {
            return;
        }
        resolved.insert(self.make_relative(&absolute), absolute);
    }

    /// Split a glob pattern into the literal directory to walk from and the
    /// segments left to match. Only segments written in the pattern count:
    /// a relative pattern starts from the base directory as-is, so glob
    /// characters in the base's own name are literal.
    fn split_glob(&self, pattern: &str, absolute: &Path) -> (PathBuf, Vec<String>) {
        let (mut root, source) = if Path::new(pattern).has_root() {
            (PathBuf::new(), absolute.to_path_buf())
        } else {
            (self.base.clone(), PathBuf::from(pattern))
        };

        let mut rest: Vec<String> = Vec::new();
        for component in source.components() {
            if component == Component::CurDir {
                continue;
            }
            let segment = component.as_os_str().to_string_lossy();
            if rest.is_empty() && !segment.contains(GLOB_META) {
                root.push(component);
            } else {
                rest.push(segment.into_owned());
            }
        }
        (normalize(&root), rest)
    }

    /// Walk from the longest literal prefix of the pattern and match the
    /// remaining segments. Without `**` the walk stops at the depth the
    /// pattern can reach.
    fn expand_glob(
        &self,
        pattern: &str,
        absolute: &Path,
        dirs_only: bool,
        resolved: &mut EntryMap,
    ) -> Result<(), FinderError> {
        let (root, rest) = self.split_glob(pattern, absolute);
        if rest.is_empty() || !root.is_dir() {
            return Ok(());
        }

        let matcher = segment_glob(&rest.join("/"))?.compile_matcher();
        let hidden = HiddenNames::new(&rest)?;

        let max_depth = if hidden.globstar.is_some() {
            usize::MAX
        } else {
            rest.len()
        };

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e) || hidden.allows(e));

        for entry in walker {
            let entry = entry?;
            if dirs_only && !entry.file_type().is_dir() {
                continue;
            }
            let Ok(candidate) = entry.path().strip_prefix(&root) else {
                continue;
            };
            if matcher.is_match(to_slash(candidate)) {
                self.push_entry(resolved, entry.path().to_path_buf());
            }
        }

        Ok(())
    }
}

fn segment_glob(pattern: &str) -> Result<Glob, FinderError> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(!cfg!(windows))
        .build()?)
}

/// Which hidden names a glob may reach, depth by depth.
///
/// A hidden name at some depth is only walked when the pattern segment for
/// that depth starts with `.` and matches it. Past a `**` the depth of each
/// segment is unknown, so any dot-prefixed segment after it may match.
struct HiddenNames {
    dotted: Vec<Option<GlobMatcher>>,
    globstar: Option<usize>,
}

impl HiddenNames {
    fn new(segments: &[String]) -> Result<Self, FinderError> {
        let dotted = segments
            .iter()
            .map(|segment| {
                if segment.starts_with('.') {
                    segment_glob(segment).map(|g| Some(g.compile_matcher()))
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let globstar = segments.iter().position(|s| s.contains("**"));
        Ok(Self { dotted, globstar })
    }

    fn allows(&self, entry: &DirEntry) -> bool {
        let index = entry.depth() - 1;
        let name = entry.file_name();
        match self.globstar {
            Some(star) if index >= star => self.dotted[star..]
                .iter()
                .flatten()
                .any(|m| m.is_match(name)),
            _ => self
                .dotted
                .get(index)
                .and_then(Option::as_ref)
                .is_some_and(|m| m.is_match(name)),
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically normalize a path: drop `.` segments and fold `..` into its
/// parent. Never touches the filesystem. `..` above the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// `/`-separated path of `path` relative to `base`, using `..` segments when
/// `path` lies outside `base`. Equal paths give an empty string.
pub fn make_relative(path: &Path, base: &Path) -> String {
    let path = normalize(path);
    let base = normalize(base);
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    parts.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Whether `path` lies strictly inside `ancestor`'s subtree.
///
/// Equal paths are not sub-paths. Comparison is per component, so `/foo2` is
/// not inside `/foo`.
pub fn is_sub_path(path: &Path, ancestor: &Path) -> bool {
    let path = normalize(path);
    let ancestor = normalize(ancestor);
    path != ancestor && path.starts_with(&ancestor)
}
