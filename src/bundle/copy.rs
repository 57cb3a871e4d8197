//! Copying resolved entries into the output tree.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use super::BundleError;

/// Copy a file, directory or symlink from `from` to `to`.
pub fn copy_entry(from: &Path, to: &Path) -> Result<(), BundleError> {
    let metadata = fs::symlink_metadata(from)?;
    if metadata.file_type().is_symlink() {
        copy_symlink(from, to)
    } else if metadata.is_dir() {
        copy_dir(from, to)
    } else {
        copy_file(from, to)
    }
}

/// Copy a regular file, creating parent directories of `to` as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), BundleError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

/// Recursively copy a directory. Symlinks inside it are recreated, not
/// followed.
pub fn copy_dir(from: &Path, to: &Path) -> Result<(), BundleError> {
    fs::create_dir_all(to)?;

    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);

        if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), BundleError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    let target = fs::read_link(from)?;
    remove_path(to)?;
    std::os::unix::fs::symlink(target, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), BundleError> {
    if from.is_dir() {
        copy_dir(from, to)
    } else {
        copy_file(from, to)
    }
}

/// Delete a file, symlink or directory tree. Returns whether anything was
/// there to delete.
pub fn remove_path(path: &Path) -> Result<bool, BundleError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
