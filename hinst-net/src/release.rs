// hinst-net/src/release.rs
// Resolves which release tag to install and derives its download URLs.

use hinst_common::config::Config;
use hinst_common::error::{HinstError, Result};
use hinst_common::model::{PlatformTarget, ReleaseDescriptor};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::validation::validate_url;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// The slice of the GitHub release object we care about.
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    #[serde(default)]
    tag_name: Option<String>,
}

pub fn latest_release_url(api_base_url: &str, repo: &str) -> String {
    format!(
        "{}/repos/{}/releases/latest",
        api_base_url.trim_end_matches('/'),
        repo
    )
}

/// Asks the GitHub API for the tag of the repository's latest release.
pub async fn fetch_latest_tag(client: &Client, config: &Config) -> Result<String> {
    let url = latest_release_url(&config.api_base_url, &config.repo);
    let fail = |reason: String| HinstError::MetadataFetch {
        repo: config.repo.clone(),
        reason,
    };
    validate_url(&url, config.allow_insecure_urls).map_err(|e| fail(e.to_string()))?;

    debug!("Fetching latest release metadata from {}", url);
    let mut request = client.get(&url).header(ACCEPT, GITHUB_ACCEPT);
    if let Some(token) = &config.github_api_token {
        debug!("Using GITHUB_TOKEN for the release metadata request");
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| fail(format!("request failed: {e}")))?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);
    if !status.is_success() {
        return Err(fail(match status {
            StatusCode::NOT_FOUND => "repository or release not found (404)".to_string(),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                format!("request refused ({status}); set GITHUB_TOKEN if you are rate limited")
            }
            _ => format!("HTTP status {status}"),
        }));
    }

    let body = response
        .text()
        .await
        .map_err(|e| fail(format!("error reading response body: {e}")))?;
    parse_tag(&body).map_err(fail)
}

fn parse_tag(body: &str) -> std::result::Result<String, String> {
    let release: GitHubRelease = serde_json::from_str(body)
        .map_err(|e| format!("invalid release metadata: {e}"))?;
    match release.tag_name.map(|t| t.trim().to_string()) {
        Some(tag) if !tag.is_empty() => Ok(tag),
        _ => Err("release metadata has no tag_name".to_string()),
    }
}

/// Picks the tag (the pinned one, or the latest release) and derives the
/// archive and manifest URLs for `platform`.
pub async fn resolve_release(
    client: &Client,
    config: &Config,
    platform: &PlatformTarget,
) -> Result<ReleaseDescriptor> {
    let tag = match &config.pinned_tag {
        Some(tag) => {
            info!("Using pinned release {}", tag);
            tag.clone()
        }
        None => fetch_latest_tag(client, config).await?,
    };
    let release = ReleaseDescriptor::derive(
        &tag,
        &config.repo,
        &config.bin_name,
        platform,
        &config.download_base_url,
    )?;
    debug!(
        "Resolved release {}: archive {} from {}",
        release.tag, release.archive_name, release.archive_url
    );
    Ok(release)
}
