//! Post-download fix-ups: executable bit, `.exe` suffix, manifest entry

use std::path::{Path, PathBuf};

use log::{debug, info};

use super::download::platform::PlatformTriple;
use super::manifest::patch_manifest;
use super::target::InstallTarget;
use crate::error::PrepareError;

/// What finalization changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeReport {
    pub installed_path: PathBuf,
    pub renamed: bool,
    pub manifest_patched: bool,
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), PrepareError> {
    use std::os::unix::fs::PermissionsExt;

    let permission = |detail: String| PrepareError::Permission {
        path: path.display().to_string(),
        detail,
    };
    let mut perms = std::fs::metadata(path)
        .map_err(|e| permission(format!("Failed to read metadata: {e}")))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .map_err(|e| permission(format!("Failed to set permissions: {e}")))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), PrepareError> {
    Ok(())
}

/// Make the installed binary runnable and keep the manifest pointing at it.
///
/// On the Windows family a bare `dir/binary` is renamed to `dir/binary.exe`
/// and the manifest bin entry gets the same suffix; elsewhere the file is
/// chmod'ed to 0755. An existing `dir/binary.exe` is never overwritten: a
/// suffix-less sibling extracted next to it is removed instead.
pub fn finalize(
    target: &InstallTarget,
    triple: &PlatformTriple,
    manifest: Option<&Path>,
) -> Result<FinalizeReport, PrepareError> {
    let installed_path = target.installed_path();
    let mut report = FinalizeReport {
        installed_path: installed_path.clone(),
        ..Default::default()
    };

    if triple.is_windows_family() {
        let base = target.base_path();
        if base != installed_path && base.is_file() {
            if installed_path.is_file() {
                std::fs::remove_file(&base).map_err(|e| PrepareError::Permission {
                    path: base.display().to_string(),
                    detail: format!("Failed to remove suffix-less duplicate: {e}"),
                })?;
                debug!("Removed {} in favour of {}", base.display(), installed_path.display());
            } else {
                std::fs::rename(&base, &installed_path).map_err(|e| PrepareError::Permission {
                    path: base.display().to_string(),
                    detail: format!("Failed to add {} suffix: {e}", target.platform_suffix()),
                })?;
                info!("Renamed {} to {}", base.display(), installed_path.display());
                report.renamed = true;
            }
        }
    } else {
        make_executable(&installed_path)?;
        debug!("Set executable permissions on {}", installed_path.display());
    }

    if let Some(manifest) = manifest {
        report.manifest_patched =
            patch_manifest(manifest, target.binary_name(), target.platform_suffix())?;
        if report.manifest_patched {
            info!("Updated {} to reference {}", manifest.display(), target.installed_name());
        }
    }

    Ok(report)
}
