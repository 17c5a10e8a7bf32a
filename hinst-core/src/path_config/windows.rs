// hinst-core/src/path_config/windows.rs
// PATH persistence through the Windows user environment.

use std::io;
use std::path::Path;
use std::process::Command;

use hinst_common::model::{
    PathConfigLocation, PathConfiguration, PathOutcome, PathReconciliationWarning,
};
use tracing::{debug, info};

use super::{same_dir, PathReconciler};

/// Read/write access to the user-scope `Path` value.
pub trait UserEnvStore: Send + Sync {
    fn read_user_path(&self) -> io::Result<Option<String>>;
    fn write_user_path(&self, value: &str) -> io::Result<()>;
}

/// Talks to the user `Path` in `HKCU\Environment` through PowerShell. The
/// value is read unexpanded and written back as `REG_EXPAND_SZ`, so entries
/// such as `%USERPROFILE%\bin` survive. Output is forced to UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellEnvStore;

const NEW_PATH_ENV: &str = "HINST_NEW_USER_PATH";
const UTF8_OUTPUT: &str = "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8";

impl PowerShellEnvStore {
    fn read_script() -> String {
        format!(
            "{UTF8_OUTPUT}; (Get-Item -Path 'HKCU:\\Environment')\
             .GetValue('Path', '', 'DoNotExpandEnvironmentNames')"
        )
    }

    fn write_script() -> String {
        format!(
            "{UTF8_OUTPUT}; Set-ItemProperty -Path 'HKCU:\\Environment' -Name 'Path' \
             -Type ExpandString -Value $env:{NEW_PATH_ENV}"
        )
    }

    fn run(script: &str, new_value: Option<&str>) -> io::Result<String> {
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command", script]);
        if let Some(value) = new_value {
            cmd.env(NEW_PATH_ENV, value);
        }
        debug!("Executing: powershell -Command {}", script);
        let output = cmd.output()?;
        if output.status.success() {
            decode_output(output.stdout)
        } else {
            Err(io::Error::other(format!(
                "powershell exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// Strict UTF-8 decode. A lossy decode would be written back as the whole
/// user PATH, so undecodable output is an error instead.
fn decode_output(stdout: Vec<u8>) -> io::Result<String> {
    String::from_utf8(stdout).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("user PATH is not valid UTF-8: {e}"),
        )
    })
}

impl UserEnvStore for PowerShellEnvStore {
    fn read_user_path(&self) -> io::Result<Option<String>> {
        let out = Self::run(&Self::read_script(), None)?;
        let value = out
            .trim_start_matches('\u{feff}')
            .trim_end_matches(['\r', '\n']);
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    fn write_user_path(&self, value: &str) -> io::Result<()> {
        Self::run(&Self::write_script(), Some(value)).map(|_| ())
    }
}

pub struct UserEnvReconciler {
    store: Box<dyn UserEnvStore>,
}

impl UserEnvReconciler {
    pub fn new(store: Box<dyn UserEnvStore>) -> Self {
        Self { store }
    }
}

impl PathReconciler for UserEnvReconciler {
    fn apply(
        &self,
        install_dir: &Path,
    ) -> std::result::Result<PathOutcome, PathReconciliationWarning> {
        let fail = |action: &str, e: io::Error| {
            PathReconciliationWarning::new(format!(
                "Could not {action} the user PATH: {e}. {}",
                self.manual_instructions(install_dir)
            ))
        };
        let configuration = PathConfiguration {
            install_dir: install_dir.to_path_buf(),
            location: PathConfigLocation::UserEnvironment,
        };

        let current = self.store.read_user_path().map_err(|e| fail("read", e))?;
        let entries: Vec<&str> = current
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .filter(|entry| !entry.trim().is_empty())
            .collect();
        if entries
            .iter()
            .any(|entry| same_dir(Path::new(entry), install_dir, true))
        {
            debug!("User PATH already contains {}", install_dir.display());
            return Ok(PathOutcome::AlreadyConfigured(configuration));
        }

        let dir = install_dir.display().to_string();
        let updated = std::iter::once(dir.as_str())
            .chain(entries.iter().copied())
            .collect::<Vec<_>>()
            .join(";");
        self.store
            .write_user_path(&updated)
            .map_err(|e| fail("update", e))?;
        info!("Prepended {} to the user PATH", install_dir.display());
        Ok(PathOutcome::Updated(configuration))
    }

    fn manual_instructions(&self, install_dir: &Path) -> String {
        format!(
            "Add {dir} to your user PATH, for example from PowerShell:\n  \
             $p = (Get-Item 'HKCU:\\Environment').GetValue('Path', '', 'DoNotExpandEnvironmentNames'); \
             Set-ItemProperty 'HKCU:\\Environment' Path \"{dir};$p\" -Type ExpandString",
            dir = install_dir.display()
        )
    }
}
