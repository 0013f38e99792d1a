//! The `package.json`-style manifest next to the installed binary.
//!
//! Only two things are touched: the `version` field is read in pinned mode,
//! and the bin entry naming the binary gets the platform suffix appended.
//! The rest of the document is left byte-for-byte as it was.

use std::path::Path;

use regex::{Captures, Regex};
use serde::Deserialize;

use super::file_ops::write_file_atomic;
use crate::error::PrepareError;

#[derive(Deserialize)]
struct VersionField {
    version: Option<String>,
}

/// Read the `version` field of the manifest at `path`
pub async fn read_version(path: &Path) -> Result<String, PrepareError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        PrepareError::Config(format!("Failed to read manifest {}: {e}", path.display()))
    })?;
    let parsed: VersionField = serde_json::from_str(&raw).map_err(|e| {
        PrepareError::Config(format!("Failed to parse manifest {}: {e}", path.display()))
    })?;

    parsed
        .version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            PrepareError::Config(format!("Manifest {} has no version field", path.display()))
        })
}

/// Rewrite `"<binary>": "...<binary>"` to end in `<binary><suffix>`.
///
/// Returns the new text, or `None` when no entry needed patching.
pub fn patch_bin_entry(content: &str, binary: &str, suffix: &str) -> Option<String> {
    if suffix.is_empty() {
        return None;
    }
    let name = regex::escape(binary);
    let pattern = format!(r#"("{name}"\s*:\s*"[^"]*?){name}""#);
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(content) {
        return None;
    }

    let patched = re.replace_all(content, |caps: &Captures<'_>| {
        format!("{}{binary}{suffix}\"", &caps[1])
    });
    Some(patched.into_owned())
}

/// Patch the manifest at `path` in place. Missing manifest is not an error.
pub fn patch_manifest(path: &Path, binary: &str, suffix: &str) -> Result<bool, PrepareError> {
    let permission = |detail: String| PrepareError::Permission {
        path: path.display().to_string(),
        detail,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(permission(format!("cannot read manifest: {e}"))),
    };

    let Some(patched) = patch_bin_entry(&content, binary, suffix) else {
        return Ok(false);
    };
    write_file_atomic(path, &patched)
        .map_err(|e| permission(format!("cannot write manifest: {e}")))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches_only_the_bin_entry() {
        let manifest =
            "{\n  \"name\": \"dprint\",\n  \"bin\": {\n    \"dprint\": \"dprint\"\n  }\n}\n";
        let patched = patch_bin_entry(manifest, "dprint", ".exe").unwrap();
        assert_eq!(
            patched,
            "{\n  \"name\": \"dprint\",\n  \"bin\": {\n    \"dprint\": \"dprint.exe\"\n  }\n}\n"
        );
    }

    #[test]
    fn keeps_path_prefix_of_bin_value() {
        let manifest = r#"{"bin":{"oxlint":"./bin/oxlint"}}"#;
        assert_eq!(
            patch_bin_entry(manifest, "oxlint", ".exe").as_deref(),
            Some(r#"{"bin":{"oxlint":"./bin/oxlint.exe"}}"#)
        );
    }

    #[test]
    fn already_patched_or_no_suffix_is_untouched() {
        let manifest = r#"{"bin":{"dprint":"dprint.exe"}}"#;
        assert_eq!(patch_bin_entry(manifest, "dprint", ".exe"), None);
        assert_eq!(patch_bin_entry(r#"{"bin":{"dprint":"dprint"}}"#, "dprint", ""), None);
    }

    #[test]
    fn binary_name_is_matched_literally() {
        let manifest = r#"{"bin":{"a.b":"a.b","axb":"axb"}}"#;
        assert_eq!(
            patch_bin_entry(manifest, "a.b", ".exe").as_deref(),
            Some(r#"{"bin":{"a.b":"a.b.exe","axb":"axb"}}"#)
        );
    }

    #[test]
    fn dollar_in_binary_name_is_not_a_capture_reference() {
        let manifest = r#"{"bin":{"tool$1":"tool$1"}}"#;
        assert_eq!(
            patch_bin_entry(manifest, "tool$1", ".exe").as_deref(),
            Some(r#"{"bin":{"tool$1":"tool$1.exe"}}"#)
        );
    }

    #[tokio::test]
    async fn reads_version_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"name": "x", "version": " 0.45.0 "}"#).unwrap();
        assert_eq!(read_version(&path).await.unwrap(), "0.45.0");

        std::fs::write(&path, r#"{"name": "x"}"#).unwrap();
        assert!(matches!(read_version(&path).await, Err(PrepareError::Config(_))));
    }

    #[test]
    fn missing_manifest_is_not_patched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        assert!(!patch_manifest(&path, "dprint", ".exe").unwrap());
    }
}
