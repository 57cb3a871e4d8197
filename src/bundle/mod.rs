//! Production bundle pipeline
//!
//! Resolves the entries to ship, copies them into the output directory,
//! prunes excluded paths inside copied directories, runs composer and
//! php-scoper there, and optionally archives the result.

mod archive;
mod copy;

pub use archive::{sha256_file, write_archive, ArchiveFormat, ArchiveReport};
pub use copy::{copy_dir, copy_entry, copy_file, remove_path};

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use wpbundle_finder::{is_sub_path, EntrySet, FinderError, PathResolver};

use crate::config::{BuiltinFallbacks, ConfigError, LayeredConfig};
use crate::exec::{ExecError, Tool};

/// Errors for bundling operations
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error(transparent)]
    Finder(#[from] FinderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Output directory {} lies inside an included directory", path.display())]
    OutputInsideEntry { path: PathBuf },

    #[error("Entry resolves outside the project root: {}", path.display())]
    EntryOutsideRoot { path: PathBuf },

    #[error("Unsupported archive format: {0} (expected zip or tar)")]
    InvalidArchiveFormat(String),
}

/// External tool step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolOptions {
    pub enabled: bool,
    pub binary: String,
    pub args: Vec<String>,
}

/// Archive step settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveOptions {
    pub enabled: bool,
    /// Archive base name and top-level folder; empty means the root's name
    pub name: String,
    pub format: String,
}

/// Typed view of the effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleOptions {
    pub output: String,
    pub clean: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_file: String,
    pub exclude_file: String,
    pub composer: ToolOptions,
    pub scoper: ToolOptions,
    pub archive: ArchiveOptions,
}

impl BundleOptions {
    /// Read options from the merged view of `config`; keys missing from
    /// every registry take the built-in fallback.
    pub fn from_config(config: &LayeredConfig) -> Result<Self, ConfigError> {
        let view = LayeredConfig::with_fallbacks(config.merged());
        let builtin = BuiltinFallbacks::default();
        fn list(values: &[String]) -> Vec<&str> {
            values.iter().map(String::as_str).collect()
        }

        Ok(Self {
            output: view.get_str_or("output", &builtin.output)?.to_string(),
            clean: view.get_bool_or("clean", builtin.clean)?,
            include: view.get_string_list_or("include", &list(&builtin.include))?,
            exclude: view.get_string_list_or("exclude", &list(&builtin.exclude))?,
            include_file: view
                .get_str_or("include_file", &builtin.include_file)?
                .to_string(),
            exclude_file: view
                .get_str_or("exclude_file", &builtin.exclude_file)?
                .to_string(),
            composer: ToolOptions {
                enabled: view.get_bool_or("composer.install", builtin.composer_install)?,
                binary: view
                    .get_str_or("composer.binary", &builtin.composer_binary)?
                    .to_string(),
                args: view.get_string_list_or("composer.args", &list(&builtin.composer_args))?,
            },
            scoper: ToolOptions {
                enabled: view.get_bool_or("scoper.enabled", builtin.scoper_enabled)?,
                binary: view
                    .get_str_or("scoper.binary", &builtin.scoper_binary)?
                    .to_string(),
                args: view.get_string_list_or("scoper.args", &list(&builtin.scoper_args))?,
            },
            archive: ArchiveOptions {
                enabled: view.get_bool_or("archive.enabled", builtin.archive_enabled)?,
                name: view
                    .get_str_or("archive.name", &builtin.archive_name)?
                    .to_string(),
                format: view
                    .get_str_or("archive.format", &builtin.archive_format)?
                    .to_string(),
            },
        })
    }
}

/// Outcome of a bundle run
#[derive(Debug, Clone, Serialize)]
pub struct BundleReport {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Relative paths copied, in inclusion order
    pub entries: Vec<String>,
    /// Paths deleted from the output after copying
    pub removed: Vec<PathBuf>,
    /// External tools that ran
    pub tools: Vec<String>,
    pub archive: Option<ArchiveReport>,
}

/// One bundling run over a project root
#[derive(Debug, Clone)]
pub struct Bundle {
    resolver: PathResolver,
    options: BundleOptions,
}

impl Bundle {
    pub fn new(root: impl AsRef<Path>, config: &LayeredConfig) -> Result<Self, BundleError> {
        Ok(Self {
            resolver: PathResolver::new(root)?,
            options: BundleOptions::from_config(config)?,
        })
    }

    pub fn root(&self) -> &Path {
        self.resolver.base()
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Absolute output directory
    pub fn output_dir(&self) -> Result<PathBuf, BundleError> {
        Ok(self.resolver.make_absolute(&self.options.output)?)
    }

    pub fn archive_format(&self) -> Result<ArchiveFormat, BundleError> {
        self.options.archive.format.parse()
    }

    /// Archive base name; defaults to the root directory's name
    pub fn archive_name(&self) -> String {
        if !self.options.archive.name.is_empty() {
            return self.options.archive.name.clone();
        }
        self.root()
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "bundle".to_string())
    }

    pub fn archive_path(&self) -> Result<PathBuf, BundleError> {
        let format = self.archive_format()?;
        Ok(self
            .root()
            .join(format!("{}.{}", self.archive_name(), format.extension())))
    }

    /// Build the entry set from the configured lists and pattern files.
    pub fn resolve(&self) -> Result<EntrySet, BundleError> {
        let mut entries = EntrySet::with_resolver(self.resolver.clone());

        optional(entries.include_many(&self.options.include))?;
        optional(entries.exclude_many(&self.options.exclude))?;
        optional(entries.include_from_file(&self.root().join(&self.options.include_file)))?;
        optional(entries.exclude_from_file(&self.root().join(&self.options.exclude_file)))?;

        let output = self.output_dir()?;
        entries.exclude(&self.resolver.make_relative(&output))?;
        if let Ok(archive) = self.archive_path() {
            entries.exclude(&self.resolver.make_relative(&archive))?;
        }

        Ok(entries)
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<BundleReport, BundleError> {
        let format = self.archive_format()?;
        let output = self.output_dir()?;
        if output == self.root() || is_sub_path(self.root(), &output) {
            return Err(BundleError::OutputInsideEntry { path: output });
        }

        if self.options.clean && remove_path(&output)? {
            tracing::info!(output = %output.display(), "cleaned output directory");
        }

        let set = self.resolve()?;
        let entries = set.entries();
        for entry in entries.iter() {
            if entry.relative.split('/').next() == Some("..") {
                return Err(BundleError::EntryOutsideRoot {
                    path: entry.absolute.clone(),
                });
            }
            if entry.absolute.is_dir() && is_sub_path(&output, &entry.absolute) {
                return Err(BundleError::OutputInsideEntry { path: output });
            }
        }

        tracing::info!(entries = entries.len(), output = %output.display(), "copying entries");
        std::fs::create_dir_all(&output)?;
        for entry in entries.iter() {
            let mut dest = output.clone();
            dest.extend(entry.relative.split('/'));
            tracing::debug!(entry = %entry.relative, "copy");
            copy_entry(&entry.absolute, &dest)?;
        }

        let mut removed = Vec::new();
        for path in set.entries_to_remove(&output) {
            if remove_path(&path)? {
                tracing::debug!(path = %path.display(), "removed");
                removed.push(path);
            }
        }

        let mut tools = Vec::new();
        let composer = &self.options.composer;
        if composer.enabled && output.join("composer.json").is_file() {
            run_tool(composer, &output)?;
            tools.push(composer.binary.clone());
        } else if composer.enabled {
            tracing::debug!("no composer.json in output, skipping composer");
        }

        let scoper = &self.options.scoper;
        if scoper.enabled {
            run_tool(scoper, &output)?;
            tools.push(scoper.binary.clone());
        }

        let archive = if self.options.archive.enabled {
            Some(write_archive(
                &output,
                &self.archive_path()?,
                &self.archive_name(),
                format,
            )?)
        } else {
            None
        };

        tracing::info!(output = %output.display(), "bundle complete");
        Ok(BundleReport {
            root: self.root().to_path_buf(),
            output,
            entries: entries.keys().map(String::from).collect(),
            removed,
            tools,
            archive,
        })
    }
}

fn run_tool(options: &ToolOptions, dir: &Path) -> Result<(), BundleError> {
    let tool = Tool::locate(&options.binary)?;
    tracing::info!(tool = %tool.name(), "running");
    tool.run_in(dir, &options.args)?;
    Ok(())
}

/// Treat a missing or empty pattern source as contributing nothing.
fn optional(result: Result<(), FinderError>) -> Result<(), FinderError> {
    match result {
        Err(FinderError::NotFound { path }) => {
            tracing::debug!(path = %path.display(), "pattern file absent");
            Ok(())
        }
        Err(FinderError::EmptyInput { origin }) => {
            tracing::debug!(%origin, "no patterns");
            Ok(())
        }
        other => other,
    }
}
