//! Filesystem primitives for the install pipeline.
//!
//! Absence is success for deletions, and manifest rewrites go through a temp
//! file so a crash never leaves a half-written manifest behind.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Remove `path` if it exists.
///
/// Returns `Ok(true)` when a file was removed and `Ok(false)` when there was
/// nothing to remove. Any other I/O failure is returned to the caller.
pub async fn delete_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Best-effort cleanup: failures are logged, never propagated
pub async fn discard(path: &Path) {
    match delete_if_exists(path).await {
        Ok(true) => log::debug!("Removed stale {}", path.display()),
        Ok(false) => {}
        Err(e) => log::debug!("Could not remove {}: {}", path.display(), e),
    }
}

/// `path` with `suffix` appended to the final component (`dprint` + `.zip`)
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Write file atomically to prevent corruption
pub fn write_file_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_if_exists_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale");

        assert!(!delete_if_exists(&path).await.unwrap());
        std::fs::write(&path, b"old").unwrap();
        assert!(delete_if_exists(&path).await.unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn with_suffix_appends_to_file_name() {
        let p = with_suffix(Path::new("/tmp/dprint"), ".tar.gz");
        assert_eq!(p, PathBuf::from("/tmp/dprint.tar.gz"));
        assert_eq!(with_suffix(Path::new("/tmp/dprint"), ""), PathBuf::from("/tmp/dprint"));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
