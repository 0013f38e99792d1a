//! Archive extraction for release assets
//!
//! Handles `.tar.gz` / `.tgz` and `.zip` assets. Only entries whose file
//! name passes the filter are written, flattened into the destination
//! directory.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::error::PrepareError;

/// Archive container, derived from the resolved extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.') {
            "tar.gz" | "tgz" => Some(ArchiveKind::TarGz),
            "zip" => Some(ArchiveKind::Zip),
            _ => None,
        }
    }
}

/// Which archive entries to keep, by bare file name
#[derive(Debug, Clone)]
pub struct EntryFilter {
    names: Vec<String>,
}

impl EntryFilter {
    /// Keep `binary` and `binary.exe`, wherever they sit in the archive
    pub fn for_binary(binary: &str) -> Self {
        Self {
            names: vec![binary.to_string(), format!("{binary}.exe")],
        }
    }

    fn accepts(&self, entry_path: &Path) -> Option<String> {
        let name = entry_path.file_name()?.to_str()?;
        self.names.iter().any(|n| n == name).then(|| name.to_string())
    }
}

/// Write `reader` to `dest_dir/name` through a temp file in the same directory
fn write_entry(reader: &mut impl Read, dest_dir: &Path, name: &str) -> io::Result<PathBuf> {
    let final_path = dest_dir.join(name);
    let mut temp = tempfile::NamedTempFile::new_in(dest_dir)?;
    io::copy(reader, &mut temp)?;
    temp.persist(&final_path).map_err(|e| e.error)?;
    Ok(final_path)
}

fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
    filter: &EntryFilter,
) -> io::Result<Vec<PathBuf>> {
    let tar_gz = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(tar_gz));
    let mut written = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let Some(name) = filter.accepts(&entry.path()?) else {
            continue;
        };
        written.push(write_entry(&mut entry, dest_dir, &name)?);
    }

    Ok(written)
}

fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
    filter: &EntryFilter,
) -> io::Result<Vec<PathBuf>> {
    let zip_file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(zip_file).map_err(io::Error::other)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(io::Error::other)?;
        if file.is_dir() {
            continue;
        }
        // entries escaping the archive root have no enclosed name
        let Some(name) = file.enclosed_name().and_then(|p| filter.accepts(&p)) else {
            continue;
        };
        written.push(write_entry(&mut file, dest_dir, &name)?);
    }

    Ok(written)
}

/// Extract the filtered entries of `archive_path` into `dest_dir`.
///
/// Runs on a blocking task. Fails when the archive is unreadable or when no
/// entry passed the filter.
pub async fn extract_archive(
    archive_path: &Path,
    kind: ArchiveKind,
    dest_dir: &Path,
    filter: EntryFilter,
) -> Result<Vec<PathBuf>, PrepareError> {
    let archive = archive_path.to_path_buf();
    let dest = dest_dir.to_path_buf();
    let display = archive_path.display().to_string();

    let result = tokio::task::spawn_blocking(move || match kind {
        ArchiveKind::TarGz => extract_tar_gz(&archive, &dest, &filter),
        ArchiveKind::Zip => extract_zip(&archive, &dest, &filter),
    })
    .await
    .map_err(|e| PrepareError::Extract {
        archive: display.clone(),
        detail: format!("extraction task failed: {e}"),
    })?;

    let written = result.map_err(|e| PrepareError::Extract {
        archive: display.clone(),
        detail: e.to_string(),
    })?;

    if written.is_empty() {
        return Err(PrepareError::Extract {
            archive: display,
            detail: "archive does not contain the requested binary".to_string(),
        });
    }

    log::debug!("Extracted {:?}", written);
    Ok(written)
}
