//! Asset download and extraction

use std::path::Path;

use futures::StreamExt;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use reqwest::Client;
use reqwest::header::ACCEPT;
use tokio::io::AsyncWriteExt;

use super::asset::ResolvedAsset;
use super::extract::{ArchiveKind, EntryFilter, extract_archive};
use crate::error::PrepareError;
use crate::install::file_ops::{delete_if_exists, discard, with_suffix};
use crate::install::target::InstallTarget;

/// What the download stage did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A same-sized bare binary was already installed; nothing was written
    AlreadyPresent,
    /// The asset was downloaded (and extracted when archived)
    Installed,
}

fn progress_bar(total: Option<u64>, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    match total {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {bytes}/{total_bytes}  {msg}")
            {
                pb.set_style(style.progress_chars("█▓░"));
            }
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}

/// Stream the response body into `path` via a `.part` file, then rename into place
async fn write_body(
    response: reqwest::Response,
    path: &Path,
    url: &str,
    quiet: bool,
) -> Result<u64, PrepareError> {
    let partial = with_suffix(path, ".part");
    let download_err = |detail: String| PrepareError::Download {
        url: url.to_string(),
        status: None,
        detail,
    };

    let pb = progress_bar(response.content_length(), quiet);
    pb.set_message(
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );

    let result = async {
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| download_err(format!("cannot create {}: {e}", partial.display())))?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| download_err(format!("transfer interrupted: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| download_err(format!("write failed: {e}")))?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }
        file.flush()
            .await
            .map_err(|e| download_err(format!("write failed: {e}")))?;
        drop(file);

        tokio::fs::rename(&partial, path)
            .await
            .map_err(|e| download_err(format!("cannot move download into place: {e}")))?;
        Ok::<u64, PrepareError>(downloaded)
    }
    .await;

    pb.finish_and_clear();
    if result.is_err() {
        discard(&partial).await;
    }
    result
}

/// Download `resolved` into `target`, extracting it when it is an archive.
pub async fn fetch_and_install(
    client: &Client,
    resolved: &ResolvedAsset,
    target: &InstallTarget,
    quiet: bool,
) -> Result<FetchOutcome, PrepareError> {
    let url = resolved.asset.browser_download_url.as_str();
    debug!("downloading asset from {url}");

    let response = client
        .get(url)
        .header(ACCEPT, "application/octet-stream")
        .send()
        .await
        .map_err(PrepareError::http("download"))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PrepareError::Download {
            url: url.to_string(),
            status: Some(status.as_u16()),
            detail: body,
        });
    }

    if !resolved.is_archive() {
        let installed = target.installed_path();
        if let (Ok(meta), Some(remote_len)) =
            (tokio::fs::metadata(&installed).await, response.content_length())
            && meta.is_file()
            && meta.len() == remote_len
        {
            info!(
                "{} is already installed ({} bytes), skipping download",
                installed.display(),
                remote_len
            );
            return Ok(FetchOutcome::AlreadyPresent);
        }
    }

    // an older `binary.exe` counts as stale too, finalize keeps it otherwise
    let download_path = target.download_path(&resolved.extension);
    let mut stale = vec![target.base_path(), download_path.clone(), target.installed_path()];
    stale.sort();
    stale.dedup();
    join_all(stale.iter().map(|path| discard(path))).await;

    info!("Downloading {}", resolved.asset.name);
    let bytes = write_body(response, &download_path, url, quiet).await?;
    debug!("wrote {bytes} bytes to {}", download_path.display());

    let Some(kind) = ArchiveKind::from_extension(&resolved.extension) else {
        // bare executable: the download is the binary, no archive to remove
        return Ok(FetchOutcome::Installed);
    };

    info!("Extracting {}", download_path.display());
    let extracted = extract_archive(
        &download_path,
        kind,
        target.directory(),
        EntryFilter::for_binary(target.binary_name()),
    )
    .await;

    if let Err(e) = delete_if_exists(&download_path).await {
        warn!("Could not remove archive {}: {}", download_path.display(), e);
    }
    extracted?;

    Ok(FetchOutcome::Installed)
}
