//! Where the binary lands

use std::path::{Path, PathBuf};

use super::download::platform::PlatformTriple;
use super::file_ops::with_suffix;

/// Install location for one run, computed once from options and platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    directory: PathBuf,
    binary_name: String,
    platform_suffix: &'static str,
}

impl InstallTarget {
    pub fn new(directory: impl Into<PathBuf>, binary_name: &str, triple: &PlatformTriple) -> Self {
        Self {
            directory: directory.into(),
            binary_name: binary_name.to_string(),
            platform_suffix: triple.executable_suffix(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    pub fn platform_suffix(&self) -> &str {
        self.platform_suffix
    }

    /// `dir/binary`
    pub fn base_path(&self) -> PathBuf {
        self.directory.join(&self.binary_name)
    }

    /// `dir/binary<extension>`, where a downloaded asset is written
    pub fn download_path(&self, extension: &str) -> PathBuf {
        with_suffix(&self.base_path(), extension)
    }

    /// `dir/binary<platform suffix>`, the final installed file
    pub fn installed_path(&self) -> PathBuf {
        with_suffix(&self.base_path(), self.platform_suffix)
    }

    pub fn installed_name(&self) -> String {
        format!("{}{}", self.binary_name, self.platform_suffix)
    }
}
