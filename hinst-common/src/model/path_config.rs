// hinst-common/src/model/path_config.rs
use std::fmt;
use std::path::PathBuf;

/// Where PATH changes for the install dir are (or would be) recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathConfigLocation {
    /// A POSIX shell startup file guarded by a marker comment.
    ShellProfile { profile: PathBuf, marker: String },
    /// The user-scope `Path` value of the Windows environment store.
    UserEnvironment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfiguration {
    pub install_dir: PathBuf,
    pub location: PathConfigLocation,
}

/// What PATH reconciliation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// The install dir is already on the session's PATH; nothing touched.
    AlreadyOnPath,
    /// The marker (or the PATH entry) was already recorded; nothing touched.
    AlreadyConfigured(PathConfiguration),
    /// The configuration was changed; a new shell picks it up.
    Updated(PathConfiguration),
    /// Nothing could be changed automatically; the user was told what to do.
    ManualActionRequired { instructions: String },
    /// Reconciliation failed; see the accompanying warning.
    Failed,
}

impl PathOutcome {
    pub fn mutated(&self) -> bool {
        matches!(self, PathOutcome::Updated(_))
    }
}

/// Non-fatal problem raised while reconciling PATH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReconciliationWarning {
    pub message: String,
}

impl PathReconciliationWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for PathReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
