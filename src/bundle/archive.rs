//! Deterministic archives of the output tree
//!
//! Both writers emit entries sorted by path under a single top-level folder,
//! with fixed timestamps and normalized modes, so the same tree always
//! produces the same bytes.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tar::{Builder, Header};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::BundleError;

/// Archive container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            _ => Err(BundleError::InvalidArchiveFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Written archive
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    /// Number of file and directory entries, including the top-level folder
    pub entries: usize,
    pub sha256: String,
}

struct Item {
    name: String,
    path: PathBuf,
    is_dir: bool,
    mode: u32,
}

/// Collect the tree under `source` in sorted order, prefixed by `folder`.
/// Symlinks are followed.
fn collect_items(source: &Path, folder: &str) -> Result<Vec<Item>, BundleError> {
    let mut items = vec![Item {
        name: format!("{}/", folder),
        path: source.to_path_buf(),
        is_dir: true,
        mode: 0o755,
    }];

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let mut name = folder.to_string();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        let is_dir = entry.file_type().is_dir();
        if is_dir {
            name.push('/');
        }
        let mode = if is_dir || is_executable(entry.path()) {
            0o755
        } else {
            0o644
        };
        items.push(Item {
            name,
            path: entry.path().to_path_buf(),
            is_dir,
            mode,
        });
    }
    Ok(items)
}

/// Archive `source` into `destination` under the top-level folder `folder`.
pub fn write_archive(
    source: &Path,
    destination: &Path,
    folder: &str,
    format: ArchiveFormat,
) -> Result<ArchiveReport, BundleError> {
    let items = collect_items(source, folder)?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    match format {
        ArchiveFormat::Zip => write_zip(&items, destination)?,
        ArchiveFormat::Tar => write_tar(&items, destination)?,
    }

    let sha256 = sha256_file(destination)?;
    tracing::info!(path = %destination.display(), %sha256, "wrote archive");

    Ok(ArchiveReport {
        path: destination.to_path_buf(),
        format,
        entries: items.len(),
        sha256,
    })
}

fn zip_options(mode: u32) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(mode)
}

fn write_zip(items: &[Item], destination: &Path) -> Result<(), BundleError> {
    let mut zip = ZipWriter::new(File::create(destination)?);

    for item in items {
        if item.is_dir {
            zip.add_directory(item.name.as_str(), zip_options(item.mode))?;
        } else {
            zip.start_file(item.name.as_str(), zip_options(item.mode))?;
            let mut file = File::open(&item.path)?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish()?.flush()?;
    Ok(())
}

fn write_tar(items: &[Item], destination: &Path) -> Result<(), BundleError> {
    let mut builder = Builder::new(File::create(destination)?);

    for item in items {
        let mut header = Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mode(item.mode);

        if item.is_dir {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            builder.append_data(&mut header, &item.name, io::empty())?;
        } else {
            let file = File::open(&item.path)?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(file.metadata()?.len());
            builder.append_data(&mut header, &item.name, file)?;
        }
    }

    builder.into_inner()?.flush()?;
    Ok(())
}

/// SHA-256 of a file as lowercase hex
pub fn sha256_file(path: &Path) -> Result<String, BundleError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            return metadata.permissions().mode() & 0o111 != 0;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir_all(out.join("src/Admin")).unwrap();
        fs::write(out.join("my-plugin.php"), "<?php // plugin").unwrap();
        fs::write(out.join("src/Plugin.php"), "<?php class Plugin {}").unwrap();
        fs::write(out.join("src/Admin/Settings.php"), "<?php").unwrap();
        dir
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("TAR".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Tar);
        assert!(matches!(
            "rar".parse::<ArchiveFormat>(),
            Err(BundleError::InvalidArchiveFormat(f)) if f == "rar"
        ));
    }

    #[test]
    fn test_zip_layout() {
        let dir = create_tree();
        let dest = dir.path().join("my-plugin.zip");

        let report =
            write_archive(&dir.path().join("dist"), &dest, "my-plugin", ArchiveFormat::Zip)
                .unwrap();
        assert_eq!(report.entries, 6);
        assert_eq!(report.sha256.len(), 64);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "my-plugin/",
                "my-plugin/my-plugin.php",
                "my-plugin/src/",
                "my-plugin/src/Admin/",
                "my-plugin/src/Admin/Settings.php",
                "my-plugin/src/Plugin.php",
            ]
        );

        let mut contents = String::new();
        archive
            .by_name("my-plugin/src/Plugin.php")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "<?php class Plugin {}");
    }

    #[test]
    fn test_archives_deterministic() {
        let dir = create_tree();
        let source = dir.path().join("dist");

        for format in [ArchiveFormat::Zip, ArchiveFormat::Tar] {
            let first = write_archive(&source, &dir.path().join("a").join("p"), "p", format).unwrap();
            let second = write_archive(&source, &dir.path().join("b").join("p"), "p", format).unwrap();
            assert_eq!(first.sha256, second.sha256, "{format} archive differs");
        }
    }

    #[test]
    fn test_tar_canonical_headers() {
        let dir = create_tree();
        let dest = dir.path().join("my-plugin.tar");
        write_archive(&dir.path().join("dist"), &dest, "my-plugin", ArchiveFormat::Tar).unwrap();

        let mut archive = tar::Archive::new(File::open(&dest).unwrap());
        let mut paths = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let header = entry.header();
            assert_eq!(header.mtime().unwrap(), 0);
            assert_eq!(header.uid().unwrap(), 0);
            assert_eq!(header.gid().unwrap(), 0);
            paths.push(entry.path().unwrap().to_string_lossy().to_string());
        }
        assert_eq!(paths[0], "my-plugin/");
        assert_eq!(paths[1], "my-plugin/my-plugin.php");
        assert_eq!(paths.len(), 6);
    }
}
