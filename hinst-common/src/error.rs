use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::pipeline::InstallStep;

#[derive(Error, Debug, Clone)]
pub enum HinstError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error(
        "Unsupported platform: os '{os}', architecture '{arch}' (supported: linux, darwin, windows on amd64 or arm64)"
    )]
    UnsupportedPlatform { os: String, arch: String },

    #[error(
        "Failed to resolve the latest release of '{repo}': {reason}. Check your network connection and the repository name."
    )]
    MetadataFetch { repo: String, reason: String },

    #[error("DownloadError: Failed to download '{url}': {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to fetch checksum manifest '{url}': {reason}")]
    ChecksumManifestFetch { url: String, reason: String },

    #[error("No checksum entry for '{archive}' in the release checksum manifest")]
    ChecksumEntryNotFound { archive: String },

    #[error("Checksum Mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to extract {archive}: {reason}")]
    Extraction { archive: String, reason: String },

    #[error("Binary '{binary}' not found in {archive} (archive contains: {entries})")]
    BinaryNotFoundInArchive {
        binary: String,
        archive: String,
        entries: String,
    },

    #[error("Installation Error at {}: {source}", .path.display())]
    Installation {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },
}

impl HinstError {
    pub fn installation(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        HinstError::Installation {
            path: path.into(),
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for HinstError {
    fn from(err: std::io::Error) -> Self {
        HinstError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for HinstError {
    fn from(err: reqwest::Error) -> Self {
        HinstError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for HinstError {
    fn from(err: serde_json::Error) -> Self {
        HinstError::Json(Arc::new(err))
    }
}

/// A fatal error tagged with the step of the install run it came from.
#[derive(Error, Debug, Clone)]
#[error("{step} failed: {source}")]
pub struct StepError {
    pub step: InstallStep,
    #[source]
    pub source: HinstError,
}

impl StepError {
    pub fn new(step: InstallStep, source: HinstError) -> Self {
        Self { step, source }
    }
}

pub type Result<T> = std::result::Result<T, HinstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_reports_both_digests() {
        let err = HinstError::ChecksumMismatch {
            file: "tool-linux-amd64.tar.xz".to_string(),
            expected: "aa11".to_string(),
            actual: "bb22".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected aa11"));
        assert!(msg.contains("got bb22"));
    }

    #[test]
    fn step_error_names_the_failed_step() {
        let err = StepError::new(
            InstallStep::VerifyChecksum,
            HinstError::ChecksumEntryNotFound {
                archive: "tool-linux-amd64.tar.xz".to_string(),
            },
        );
        assert!(err
            .to_string()
            .starts_with("checksum verification failed: "));
    }

    #[test]
    fn installation_error_keeps_the_attempted_path() {
        let err = HinstError::installation(
            "/opt/bin/tool",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/opt/bin/tool"));
    }
}
