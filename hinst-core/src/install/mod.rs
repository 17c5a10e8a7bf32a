// hinst-core/src/install/mod.rs
// Places a verified binary at its final location.

use hinst_aio::extract::VerifiedBinary;
use hinst_aio::fs as hfs;
use hinst_common::error::{HinstError, Result};
use hinst_common::model::InstallationTarget;
use tracing::{debug, warn};

const EXECUTABLE_MODE: u32 = 0o755;

/// Moves `binary` to `target.binary_path()`, replacing whatever was there.
/// Returns whether an existing file was replaced.
///
/// A failure to remove the previous file is only logged; the move that follows
/// overwrites it where the platform allows.
pub fn install_binary(binary: &VerifiedBinary, target: &InstallationTarget) -> Result<bool> {
    let dest = target.binary_path();
    debug!(
        "Installing {} to {}",
        binary.path().display(),
        dest.display()
    );

    let replaced = match hfs::remove_file_if_exists(dest) {
        Ok(removed) => {
            if removed {
                debug!("Removed previously installed {}", dest.display());
            }
            removed
        }
        Err(e) => {
            warn!(
                "Could not remove existing binary at {}: {}; attempting to overwrite",
                dest.display(),
                e
            );
            true
        }
    };

    std::fs::create_dir_all(target.dir())
        .map_err(|e| HinstError::installation(target.dir(), e))?;
    hfs::move_file(binary.path(), dest).map_err(|e| HinstError::installation(dest, e))?;
    hfs::set_permissions(dest, EXECUTABLE_MODE).map_err(|e| HinstError::installation(dest, e))?;

    debug!("Installed {}", dest.display());
    Ok(replaced)
}
