use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PrepareError;
use crate::install::download::platform::HostFacts;

/// Default GitHub REST endpoint
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Default manifest file name, looked up in the install directory
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Supported remote hosting APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Remote {
    #[default]
    Github,
}

/// Token categories consumed, in order, from an asset file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchToken {
    Binary,
    Version,
    Vendor,
    Os,
    Arch,
    /// libc flavour (gnu / musl), only when configured
    Lib,
}

impl MatchToken {
    pub fn default_order() -> Vec<MatchToken> {
        vec![
            MatchToken::Binary,
            MatchToken::Version,
            MatchToken::Vendor,
            MatchToken::Os,
            MatchToken::Arch,
        ]
    }
}

/// Partial overrides for the platform lookup tables.
///
/// Keys are host-reported values; an empty string value means the category
/// is omitted from matching on that host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOverrides {
    pub arch: BTreeMap<String, String>,
    pub vendor: BTreeMap<String, String>,
    pub os: BTreeMap<String, String>,
    /// libc flavour token ("gnu" or "musl")
    pub lib: Option<String>,
    /// Drop the built-in vendor table before applying `vendor`
    pub clear_vendor: bool,
    pub clear_arch: bool,
    pub clear_os: bool,
}

/// Everything a single `prepare` run needs
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub remote: Remote,
    pub author: String,
    pub repository: String,
    pub remote_token: Option<String>,
    pub binary: String,
    pub use_package_json: bool,
    pub orders: Vec<MatchToken>,
    pub stable_only: bool,
    pub tag_prefix: String,
    pub install_dir: PathBuf,
    /// Defaults to `install_dir/package.json`
    pub manifest_path: Option<PathBuf>,
    pub api_base: String,
    pub maps: MapOverrides,
    pub host: HostFacts,
    /// Hide the download progress bar
    pub quiet: bool,
}

impl PrepareOptions {
    /// Options with defaults for everything but the project coordinates
    pub fn new(
        author: impl Into<String>,
        repository: impl Into<String>,
        binary: impl Into<String>,
    ) -> Self {
        Self {
            remote: Remote::Github,
            author: author.into(),
            repository: repository.into(),
            remote_token: None,
            binary: binary.into(),
            use_package_json: false,
            orders: MatchToken::default_order(),
            stable_only: true,
            tag_prefix: "v".to_string(),
            install_dir: PathBuf::from("."),
            manifest_path: None,
            api_base: GITHUB_API_BASE.to_string(),
            maps: MapOverrides::default(),
            host: HostFacts::detect(),
            quiet: false,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path
            .clone()
            .unwrap_or_else(|| self.install_dir.join(DEFAULT_MANIFEST))
    }

    /// Reject options that cannot produce a meaningful run
    pub fn validate(&self) -> Result<(), PrepareError> {
        for (name, value) in [
            ("author", &self.author),
            ("repository", &self.repository),
            ("binary", &self.binary),
        ] {
            if value.trim().is_empty() {
                return Err(PrepareError::Config(format!("`{name}` must not be empty")));
            }
        }
        if self.binary.contains(['/', '\\']) {
            return Err(PrepareError::Config(format!(
                "`binary` must be a file name, got '{}'",
                self.binary
            )));
        }
        if self.orders.is_empty() {
            return Err(PrepareError::Config("`orders` must name at least one token".into()));
        }
        Ok(())
    }
}

/// On-disk configuration file (TOML). Every field is optional; CLI flags win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub remote: Option<Remote>,
    pub author: Option<String>,
    pub repository: Option<String>,
    pub binary: Option<String>,
    pub use_package_json: Option<bool>,
    pub orders: Option<Vec<MatchToken>>,
    pub stable_only: Option<bool>,
    pub tag_prefix: Option<String>,
    pub dir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub api_base: Option<String>,
    pub maps: MapOverrides,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, PrepareError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PrepareError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::parse(&raw).map_err(|e| {
            PrepareError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
