//! Release binary installation
//!
//! Drives the pipeline: platform → release → asset → download/extract →
//! finalize. Each stage returns a [`PrepareError`] on failure and nothing
//! after a failed stage runs.

pub mod download;
pub mod file_ops;
pub mod finalize;
pub mod manifest;
pub mod target;

use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use crate::config::{PrepareOptions, Remote};
use crate::error::PrepareError;
use download::{
    FetchOutcome, GitHubRemote, MatchTokens, PlatformMaps, PlatformTriple, ReleaseQuery,
    ReleaseSource, build_client, fetch_and_install, resolve_asset,
};
use target::InstallTarget;

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Installed,
    AlreadyPresent,
}

/// Summary of a successful `prepare` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: InstallStatus,
    pub tag: String,
    pub asset: String,
    pub path: PathBuf,
    pub manifest_patched: bool,
}

/// Resolve, download and install the release binary described by `options`
pub async fn prepare(options: &PrepareOptions) -> Result<Outcome, PrepareError> {
    options.validate()?;

    let maps = PlatformMaps::with_overrides(&options.maps);
    let triple = PlatformTriple::resolve(&options.host, &maps)?;

    let client = build_client(options.remote_token.as_deref())?;
    let remote = match options.remote {
        Remote::Github => GitHubRemote::new(
            client.clone(),
            &options.api_base,
            &options.author,
            &options.repository,
            options.remote_token.as_deref().is_some_and(|t| !t.is_empty()),
        ),
    };

    let manifest_path = options.manifest_path();
    let (query, pinned_version) = if options.use_package_json {
        let version = manifest::read_version(&manifest_path).await?;
        info!("Pinned to version {} from {}", version, manifest_path.display());
        (
            ReleaseQuery::Pinned {
                version: version.clone(),
                tag_prefix: options.tag_prefix.clone(),
            },
            Some(version),
        )
    } else {
        (
            ReleaseQuery::Latest {
                stable_only: options.stable_only,
            },
            None,
        )
    };
    let release = remote.locate(&query).await?;

    let version = pinned_version.as_deref().unwrap_or(&release.tag_name);
    let tokens = MatchTokens::new(
        &options.orders,
        &options.binary,
        version,
        &options.tag_prefix,
        &triple,
    );
    let resolved = resolve_asset(&release.assets, &tokens, &release.tag_name)?;
    info!(
        "Selected asset {} ({})",
        resolved.asset.name,
        if resolved.is_archive() { resolved.extension.as_str() } else { "bare executable" }
    );

    let target = InstallTarget::new(&options.install_dir, &options.binary, &triple);
    tokio::fs::create_dir_all(target.directory()).await.map_err(|e| {
        PrepareError::Config(format!(
            "Failed to create install directory {}: {e}",
            target.directory().display()
        ))
    })?;
    let fetched = fetch_and_install(&client, &resolved, &target, options.quiet).await?;

    let status = match fetched {
        FetchOutcome::AlreadyPresent => InstallStatus::AlreadyPresent,
        FetchOutcome::Installed => InstallStatus::Installed,
    };

    // the binary is in place at this point; fix-up failures are not fatal
    let manifest_patched = match finalize::finalize(&target, &triple, Some(&manifest_path)) {
        Ok(report) => report.manifest_patched,
        Err(e) => {
            warn!("{e}");
            false
        }
    };

    Ok(Outcome {
        status,
        tag: release.tag_name,
        asset: resolved.asset.name,
        path: target.installed_path(),
        manifest_patched,
    })
}
