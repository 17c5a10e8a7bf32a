/*
File: hinst-aio/src/fs.rs
Purpose: Primitive synchronous filesystem operations used by the install steps.
*/
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hinst_common::error::{HinstError, Result};
use tempfile::TempDir;
use tracing::{debug, error, warn};

const TEMP_DIR_PREFIX: &str = "hinst-";

/// Scratch directory owned by a single install run. The directory and
/// everything in it is removed when the guard is dropped, on success, on an
/// early `?` return, and during unwinding.
#[derive(Debug)]
pub struct ScopedTempDir {
    inner: TempDir,
}

impl ScopedTempDir {
    /// Creates a fresh, uniquely named directory under `parent`, or under the
    /// system temp dir when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let inner = match parent {
            Some(parent) => {
                create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!("Created run temp dir {}", inner.path().display());
        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.inner.path().join(name)
    }

    /// Removes the directory now and reports failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.inner.path().to_path_buf();
        self.inner.close().map_err(|e| {
            warn!("Failed to remove temp dir {}: {}", path.display(), e);
            HinstError::from(e)
        })
    }
}

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        HinstError::from(e)
    })
}

/// Removes a file. A missing file is not an error; returns whether something
/// was removed.
pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    debug!("Removing file: {}", path.display());
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            error!("Failed remove file {}: {}", path.display(), e);
            Err(e)
        }
    }
}

/// Moves `from` to `to`. A plain rename is tried first; when the two paths are
/// on different filesystems the file is copied next to `to` and renamed over it,
/// so `to` is never observed half-written.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    debug!("Moving {} -> {}", from.display(), to.display());
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(
                "Rename crossed filesystems ({}); copying {} instead",
                e,
                from.display()
            );
            let staging = staging_path_for(to);
            if let Err(copy_err) = fs::copy(from, &staging) {
                let _ = fs::remove_file(&staging);
                return Err(copy_err);
            }
            if let Err(rename_err) = fs::rename(&staging, to) {
                let _ = fs::remove_file(&staging);
                return Err(rename_err);
            }
            if let Err(e) = fs::remove_file(from) {
                warn!("Failed to remove moved source {}: {}", from.display(), e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn staging_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.hinst-new"))
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(windows)]
fn is_cross_device(err: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(all(not(unix), not(windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Sets file permissions (Unix only). Mode is standard Unix octal mode.
#[cfg(unix)]
pub fn set_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    debug!("Setting permissions on {}: {:o}", path.display(), mode);
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
        error!("Failed set permissions on {}: {}", path.display(), e);
        e
    })
}

#[cfg(not(unix))]
pub fn set_permissions(path: &Path, _mode: u32) -> io::Result<()> {
    // Executability on Windows comes from the .exe extension.
    debug!("Skipping permission change on {}", path.display());
    Ok(())
}
