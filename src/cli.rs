use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use binprep::{ConfigFile, HostFacts, MatchToken, PrepareOptions, Remote};

#[derive(Parser, Debug)]
#[command(version, about = "Install the prebuilt release binary for this platform")]
pub struct Args {
    /// Remote hosting API
    #[arg(long, value_enum)]
    pub remote: Option<Remote>,

    /// Owner of the remote repository
    #[arg(long)]
    pub author: Option<String>,

    /// Remote repository name
    #[arg(long)]
    pub repository: Option<String>,

    /// Bearer token for the remote API
    #[arg(long, env = "REMOTE_TOKEN", hide_env_values = true)]
    pub remote_token: Option<String>,

    /// Executable base name, used for matching and as the output file name
    #[arg(long)]
    pub binary: Option<String>,

    /// Install the release matching the manifest's version field
    #[arg(long)]
    pub use_package_json: bool,

    /// Token match order, e.g. binary,arch,vendor,os
    #[arg(long, value_enum, value_delimiter = ',')]
    pub orders: Option<Vec<MatchToken>>,

    /// Consider prereleases when picking the latest release
    #[arg(long)]
    pub allow_prerelease: bool,

    /// Prefix prepended to the manifest version to form a tag
    #[arg(long)]
    pub tag_prefix: Option<String>,

    /// Install directory (defaults to the current directory)
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Manifest to read/patch (defaults to <dir>/package.json)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Base URL of the remote API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Host architecture to prepare for (defaults to this machine)
    #[arg(long)]
    pub host_arch: Option<String>,

    /// Host OS to prepare for (defaults to this machine)
    #[arg(long)]
    pub host_os: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Only log warnings and hide the progress bar
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Args {
    /// Merge CLI flags over the optional config file
    pub fn into_options(self) -> Result<PrepareOptions> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path).context("Failed to load configuration")?,
            None => ConfigFile::default(),
        };

        let author = self
            .author
            .or(file.author)
            .ok_or_else(|| anyhow!("--author is required"))?;
        let repository = self
            .repository
            .or(file.repository)
            .ok_or_else(|| anyhow!("--repository is required"))?;
        let binary = self
            .binary
            .or(file.binary)
            .ok_or_else(|| anyhow!("--binary is required"))?;

        let mut options = PrepareOptions::new(author, repository, binary);
        if let Some(remote) = self.remote.or(file.remote) {
            options.remote = remote;
        }
        options.remote_token = self
            .remote_token
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.is_empty());
        options.use_package_json = self.use_package_json || file.use_package_json.unwrap_or(false);
        if let Some(orders) = self.orders.or(file.orders) {
            options.orders = orders;
        }
        options.stable_only = !self.allow_prerelease && file.stable_only.unwrap_or(true);
        if let Some(prefix) = self.tag_prefix.or(file.tag_prefix) {
            options.tag_prefix = prefix;
        }
        if let Some(dir) = self.dir.or(file.dir) {
            options.install_dir = dir;
        }
        options.manifest_path = self.manifest.or(file.manifest);
        if let Some(api_base) = self.api_base.or(file.api_base) {
            options.api_base = api_base;
        }
        options.maps = file.maps;
        let detected = HostFacts::detect();
        options.host = HostFacts::new(
            self.host_arch.unwrap_or(detected.arch),
            self.host_os.unwrap_or(detected.os),
        );
        options.quiet = self.quiet;

        Ok(options)
    }
}
