// hinst-common/src/model/artifact.rs
use std::path::{Path, PathBuf};

/// An archive fetched into the run's temp dir. Nothing about its content is
/// trusted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Final on-disk location of the installed executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationTarget {
    pub dir: PathBuf,
    pub binary_path: PathBuf,
}

impl InstallationTarget {
    pub fn new(dir: impl Into<PathBuf>, binary_file_name: &str) -> Self {
        let dir = dir.into();
        let binary_path = dir.join(binary_file_name);
        Self { dir, binary_path }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}
