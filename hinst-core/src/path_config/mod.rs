// hinst-core/src/path_config/mod.rs
//! Makes the install directory reachable from new shells. Everything here is
//! advisory: problems become warnings, never install failures.

use std::ffi::OsStr;
use std::path::Path;

use hinst_common::config::Config;
use hinst_common::model::{PathOutcome, PathReconciliationWarning};
use tracing::{debug, info, warn};

pub mod profile;
pub mod windows;

pub use profile::ShellProfileReconciler;
pub use windows::{PowerShellEnvStore, UserEnvReconciler, UserEnvStore};

/// A place where PATH can be persisted for the current user.
pub trait PathReconciler: Send + Sync {
    /// Records `install_dir` on the persisted PATH unless it is already there.
    fn apply(
        &self,
        install_dir: &Path,
    ) -> std::result::Result<PathOutcome, PathReconciliationWarning>;

    /// What the user should do by hand when nothing is changed automatically.
    fn manual_instructions(&self, install_dir: &Path) -> String;
}

/// The reconciler for the host platform.
pub fn default_reconciler(config: &Config) -> Box<dyn PathReconciler> {
    if cfg!(windows) {
        Box::new(UserEnvReconciler::new(Box::new(PowerShellEnvStore)))
    } else {
        Box::new(ShellProfileReconciler::from_env(
            config.home_dir(),
            config.path_marker(),
        ))
    }
}

/// Reconciles PATH for `install_dir` given the session's `PATH` value.
///
/// With `modify` off nothing is written; the user gets instructions when the
/// directory is missing from PATH.
pub fn reconcile(
    reconciler: &dyn PathReconciler,
    install_dir: &Path,
    session_path: Option<&OsStr>,
    modify: bool,
) -> (PathOutcome, Vec<PathReconciliationWarning>) {
    if is_on_path(install_dir, session_path) {
        debug!("{} is already on PATH", install_dir.display());
        return (PathOutcome::AlreadyOnPath, Vec::new());
    }
    if !modify {
        info!("Not modifying PATH; {} is not on it", install_dir.display());
        return (
            PathOutcome::ManualActionRequired {
                instructions: reconciler.manual_instructions(install_dir),
            },
            Vec::new(),
        );
    }
    match reconciler.apply(install_dir) {
        Ok(outcome) => {
            debug!("PATH reconciliation outcome: {:?}", outcome);
            (outcome, Vec::new())
        }
        Err(warning) => {
            warn!("{}", warning);
            (PathOutcome::Failed, vec![warning])
        }
    }
}

/// Whether `dir` is one of the entries of `path_var`. Trailing separators are
/// ignored; on Windows the comparison is case-insensitive.
pub fn is_on_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    let Some(path_var) = path_var else {
        return false;
    };
    std::env::split_paths(path_var).any(|entry| same_dir(&entry, dir, cfg!(windows)))
}

pub(crate) fn same_dir(a: &Path, b: &Path, ignore_case: bool) -> bool {
    let a = normalize(&a.to_string_lossy());
    let b = normalize(&b.to_string_lossy());
    if ignore_case {
        a.eq_ignore_ascii_case(&b)
    } else {
        a == b
    }
}

fn normalize(s: &str) -> String {
    let trimmed = s.trim().trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !s.trim().is_empty() {
        // The root directory itself.
        s.trim()[..1].to_string()
    } else {
        trimmed.to_string()
    }
}
