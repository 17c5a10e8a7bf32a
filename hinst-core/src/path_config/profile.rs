// hinst-core/src/path_config/profile.rs
// PATH persistence for POSIX shells through a startup file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hinst_common::model::{
    PathConfigLocation, PathConfiguration, PathOutcome, PathReconciliationWarning,
};
use tracing::{debug, info};

use super::PathReconciler;

/// Profiles consulted, in order, when the user's shell is not zsh. Only
/// existing files qualify.
const FALLBACK_PROFILES: [&str; 4] = [".bashrc", ".profile", ".bash_profile", ".zprofile"];

#[derive(Debug, Clone)]
pub struct ShellProfileReconciler {
    home: PathBuf,
    marker: String,
    prefers_zsh: bool,
}

impl ShellProfileReconciler {
    pub fn new(home: impl Into<PathBuf>, marker: impl Into<String>, prefers_zsh: bool) -> Self {
        Self {
            home: home.into(),
            marker: marker.into(),
            prefers_zsh,
        }
    }

    /// Detects zsh from `ZSH_VERSION` or a `SHELL` ending in `zsh`.
    pub fn from_env(home: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        let zsh_version = std::env::var_os("ZSH_VERSION").is_some();
        let shell_is_zsh = std::env::var("SHELL").is_ok_and(|s| s.ends_with("zsh"));
        debug!(
            "Shell detection: ZSH_VERSION set={}, SHELL is zsh={}",
            zsh_version, shell_is_zsh
        );
        Self::new(home, marker, zsh_version || shell_is_zsh)
    }

    /// The startup file PATH changes go to, if any.
    pub fn select_profile(&self) -> Option<PathBuf> {
        if self.prefers_zsh {
            return Some(self.home.join(".zshrc"));
        }
        FALLBACK_PROFILES
            .iter()
            .map(|name| self.home.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// `export PATH="<dir>:$PATH"` with the characters that stay special
    /// inside double quotes escaped.
    fn export_line(install_dir: &Path) -> String {
        let mut dir = String::new();
        for c in install_dir.display().to_string().chars() {
            if matches!(c, '"' | '\\' | '$' | '`') {
                dir.push('\\');
            }
            dir.push(c);
        }
        format!("export PATH=\"{dir}:$PATH\"")
    }

    fn append_block(&self, profile: &Path, install_dir: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(profile)?;
        write!(
            file,
            "\n{}\n{}\n",
            self.marker,
            Self::export_line(install_dir)
        )?;
        file.flush()
    }
}

impl PathReconciler for ShellProfileReconciler {
    fn apply(
        &self,
        install_dir: &Path,
    ) -> std::result::Result<PathOutcome, PathReconciliationWarning> {
        let Some(profile) = self.select_profile() else {
            info!("No shell profile found under {}", self.home.display());
            return Ok(PathOutcome::ManualActionRequired {
                instructions: self.manual_instructions(install_dir),
            });
        };
        let configuration = PathConfiguration {
            install_dir: install_dir.to_path_buf(),
            location: PathConfigLocation::ShellProfile {
                profile: profile.clone(),
                marker: self.marker.clone(),
            },
        };

        let existing = match fs::read_to_string(&profile) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(PathReconciliationWarning::new(format!(
                    "Could not read {}: {}. {}",
                    profile.display(),
                    e,
                    self.manual_instructions(install_dir)
                )))
            }
        };
        if existing.contains(&self.marker) {
            debug!(
                "{} already carries the PATH marker; leaving it alone",
                profile.display()
            );
            return Ok(PathOutcome::AlreadyConfigured(configuration));
        }

        debug!("Adding {} to PATH in {}", install_dir.display(), profile.display());
        self.append_block(&profile, install_dir).map_err(|e| {
            PathReconciliationWarning::new(format!(
                "Could not update {}: {}. {}",
                profile.display(),
                e,
                self.manual_instructions(install_dir)
            ))
        })?;
        info!("Updated {} with the install directory", profile.display());
        Ok(PathOutcome::Updated(configuration))
    }

    fn manual_instructions(&self, install_dir: &Path) -> String {
        format!(
            "Add {} to your PATH by putting this line in your shell configuration file (e.g. ~/.zshrc or ~/.bashrc):\n  {}",
            install_dir.display(),
            Self::export_line(install_dir)
        )
    }
}
