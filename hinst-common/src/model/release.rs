// hinst-common/src/model/release.rs
use serde::{Deserialize, Serialize};
use url::Url;

use super::platform::PlatformTarget;
use crate::error::{HinstError, Result};

pub const CHECKSUMS_FILE_NAME: &str = "checksums.txt";

/// Metadata for the release being installed. Everything except the tag is
/// derived from the tag, the repository and the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub tag: String,
    pub archive_name: String,
    pub archive_url: String,
    pub checksums_url: String,
}

impl ReleaseDescriptor {
    pub fn derive(
        tag: &str,
        repo: &str,
        bin_name: &str,
        platform: &PlatformTarget,
        download_base_url: &str,
    ) -> Result<Self> {
        let archive_name = platform.archive_name(bin_name);
        let asset_url = |asset: &str| release_asset_url(download_base_url, repo, tag, asset);
        Ok(Self {
            tag: tag.to_string(),
            archive_url: asset_url(&archive_name)?,
            checksums_url: asset_url(CHECKSUMS_FILE_NAME)?,
            archive_name,
        })
    }
}

/// `{base}/{owner}/{name}/releases/download/{tag}/{asset}`, with the tag and
/// asset percent-encoded as single path segments.
fn release_asset_url(base: &str, repo: &str, tag: &str, asset: &str) -> Result<String> {
    let invalid = |reason: String| {
        HinstError::Config(format!("Invalid download base URL '{base}': {reason}"))
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("it cannot carry a path".to_string()))?
        .pop_if_empty()
        .extend(repo.split('/'))
        .extend(["releases", "download", tag, asset]);
    Ok(url.to_string())
}
