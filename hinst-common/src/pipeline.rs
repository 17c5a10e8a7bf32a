// hinst-common/src/pipeline.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{PathOutcome, PathReconciliationWarning, PlatformTarget};

/// The fallible transitions of an install run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallStep {
    ResolvePlatform,
    ResolveRelease,
    Download,
    VerifyChecksum,
    Extract,
    Install,
    ReconcilePath,
}

impl InstallStep {
    pub const ALL: [InstallStep; 7] = [
        InstallStep::ResolvePlatform,
        InstallStep::ResolveRelease,
        InstallStep::Download,
        InstallStep::VerifyChecksum,
        InstallStep::Extract,
        InstallStep::Install,
        InstallStep::ReconcilePath,
    ];

    /// State the run is in once this step has completed.
    pub fn completed_state(self) -> RunState {
        match self {
            InstallStep::ResolvePlatform => RunState::PlatformResolved,
            InstallStep::ResolveRelease => RunState::ReleaseResolved,
            InstallStep::Download => RunState::Downloaded,
            InstallStep::VerifyChecksum => RunState::ChecksumVerified,
            InstallStep::Extract => RunState::Extracted,
            InstallStep::Install => RunState::Installed,
            InstallStep::ReconcilePath => RunState::PathReconciled,
        }
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStep::ResolvePlatform => "platform detection",
            InstallStep::ResolveRelease => "release resolution",
            InstallStep::Download => "download",
            InstallStep::VerifyChecksum => "checksum verification",
            InstallStep::Extract => "extraction",
            InstallStep::Install => "installation",
            InstallStep::ReconcilePath => "PATH configuration",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Start,
    PlatformResolved,
    ReleaseResolved,
    Downloaded,
    ChecksumVerified,
    Extracted,
    Installed,
    PathReconciled,
    Done,
    Failed,
}

impl RunState {
    /// Advances along the linear run sequence. `Done` and `Failed` are terminal.
    pub fn advance(self, completed: InstallStep) -> RunState {
        match self {
            RunState::Done | RunState::Failed => self,
            _ => completed.completed_state(),
        }
    }
}

/// Summary of a finished run, printed by the CLI.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub tag: String,
    pub platform: PlatformTarget,
    pub installed_path: PathBuf,
    pub sha256: String,
    pub replaced_existing: bool,
    pub path_outcome: PathOutcome,
    pub warnings: Vec<PathReconciliationWarning>,
    pub final_state: RunState,
}
