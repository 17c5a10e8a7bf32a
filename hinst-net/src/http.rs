use std::fs;
use std::path::Path;
use std::time::Duration;

use hinst_common::error::{HinstError, Result};
use hinst_common::model::DownloadedArtifact;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use crate::validation::validate_url;

const REQUEST_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT_STRING: &str = concat!(
    "hinst/",
    env!("CARGO_PKG_VERSION"),
    " (Rust; release installer)"
);

pub fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| HinstError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Streams `url` into `dest`. On any failure, a refused URL included, the
/// partially written file is removed and a `Download` error naming the URL is
/// returned.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    allow_insecure: bool,
    show_progress: bool,
) -> Result<DownloadedArtifact> {
    validate_url(url, allow_insecure).map_err(|e| HinstError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let file_name = dest
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("Downloading {} to {}", url, dest.display());

    match stream_to_file(client, url, dest, show_progress).await {
        Ok(size_bytes) => {
            debug!("Downloaded {} bytes to {}", size_bytes, dest.display());
            Ok(DownloadedArtifact {
                path: dest.to_path_buf(),
                file_name,
                size_bytes,
            })
        }
        Err(reason) => {
            error!("Download failed from {}: {}", url, reason);
            remove_partial(dest);
            Err(HinstError::Download {
                url: url.to_string(),
                reason,
            })
        }
    }
}

/// Downloads the release checksum manifest to `dest` and returns its text.
pub async fn fetch_checksum_manifest(
    client: &Client,
    url: &str,
    dest: &Path,
    allow_insecure: bool,
) -> Result<String> {
    debug!("Fetching checksum manifest {}", url);
    let fail = |reason: String| HinstError::ChecksumManifestFetch {
        url: url.to_string(),
        reason,
    };
    validate_url(url, allow_insecure).map_err(|e| fail(e.to_string()))?;

    if let Err(reason) = stream_to_file(client, url, dest, false).await {
        error!("Checksum manifest fetch failed from {}: {}", url, reason);
        remove_partial(dest);
        return Err(fail(reason));
    }
    let bytes = fs::read(dest).map_err(|e| fail(format!("cannot read {}: {e}", dest.display())))?;
    String::from_utf8(bytes).map_err(|e| fail(format!("manifest is not valid UTF-8: {e}")))
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(
                "Could not remove partial download {}: {}",
                path.display(),
                e
            );
        }
    }
}

/// Returns the number of bytes written. Errors are plain reasons; callers pick
/// the error variant.
async fn stream_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> std::result::Result<u64, String> {
    let mut response = client.get(url).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        format!("request failed: {e}")
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        return Err(match status {
            StatusCode::NOT_FOUND => "not found (404)".to_string(),
            StatusCode::FORBIDDEN => "access forbidden (403)".to_string(),
            _ => format!("HTTP status {status}"),
        });
    }

    let expected_len = response.content_length();
    let progress = download_progress(expected_len, show_progress);

    let mut file = TokioFile::create(dest)
        .await
        .map_err(|e| format!("cannot create {}: {e}", dest.display()))?;
    let mut written: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("error reading response body: {e}"))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("cannot write {}: {e}", dest.display()))?;
        written += chunk.len() as u64;
        progress.set_position(written);
    }
    file.flush()
        .await
        .map_err(|e| format!("cannot flush {}: {e}", dest.display()))?;
    drop(file);
    progress.finish_and_clear();

    if let Some(expected) = expected_len {
        if written < expected {
            return Err(format!(
                "body truncated: received {written} of {expected} bytes"
            ));
        }
    }
    Ok(written)
}

fn download_progress(len: Option<u64>, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.blue.bold} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=> "));
            }
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.blue.bold} {bytes}") {
                pb.set_style(style);
            }
            pb
        }
    }
}
