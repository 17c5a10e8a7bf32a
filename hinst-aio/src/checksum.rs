// hinst-aio/src/checksum.rs
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use hinst_common::error::{HinstError, Result};
use hinst_common::model::DownloadedArtifact;
use sha2::{Digest, Sha256};
use tracing::debug;

/// One `<hex-digest> <filename>` line of a release checksum manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    pub digest: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ChecksumEntry>,
}

impl ChecksumManifest {
    /// Parses `sha256sum`-style output. Blank lines, `#` comments and lines
    /// without two fields are skipped; a leading `*` (binary mode) on the file
    /// name is dropped.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let digest = fields.next()?;
                let file_name = fields.next()?;
                Some(ChecksumEntry {
                    digest: digest.to_string(),
                    file_name: file_name.trim_start_matches('*').to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ChecksumEntry] {
        &self.entries
    }

    /// Exact file-name match; `tool-linux-amd64.tar.xz` never matches
    /// `mytool-linux-amd64.tar.xz` or `tool-linux-amd64.tar.xz.sig`.
    pub fn digest_for(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.file_name == file_name)
            .map(|entry| entry.digest.as_str())
    }
}

/// An archive whose SHA-256 matched the manifest. Only [`verify_artifact`]
/// constructs one, so holding it proves the check happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArtifact {
    path: PathBuf,
    file_name: String,
    sha256: String,
}

impl VerifiedArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

/// Streams a file through SHA-256 and returns the lowercase hex digest.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let bytes_copied = io::copy(&mut reader, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());
    debug!(
        "Calculated SHA256 of {}: {} ({} bytes read)",
        path.display(),
        actual,
        bytes_copied
    );
    Ok(actual)
}

pub fn verify_checksum(path: &Path, expected: &str) -> Result<String> {
    debug!("Verifying checksum for: {}", path.display());
    let actual = sha256_file(path)?;
    debug!("Expected SHA256:   {}", expected);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(actual)
    } else {
        Err(HinstError::ChecksumMismatch {
            file: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            expected: expected.trim().to_ascii_lowercase(),
            actual,
        })
    }
}

/// The integrity gate: looks the artifact up in the manifest and checks its digest.
pub fn verify_artifact(
    artifact: DownloadedArtifact,
    manifest: &ChecksumManifest,
) -> Result<VerifiedArtifact> {
    let expected = manifest.digest_for(&artifact.file_name).ok_or_else(|| {
        HinstError::ChecksumEntryNotFound {
            archive: artifact.file_name.clone(),
        }
    })?;
    let sha256 = verify_checksum(&artifact.path, expected)?;
    tracing::debug!(
        "Checksum verified for {} ({} bytes)",
        artifact.file_name,
        artifact.size_bytes
    );
    Ok(VerifiedArtifact {
        path: artifact.path,
        file_name: artifact.file_name,
        sha256,
    })
}
