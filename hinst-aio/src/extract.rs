// hinst-aio/src/extract.rs
// Pulls the single expected executable out of a verified release archive.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use hinst_common::error::{HinstError, Result};
use hinst_common::model::ArchiveFormat;
use tar::{Archive, EntryType};
use tracing::{debug, error};
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::checksum::VerifiedArtifact;

/// Entry names listed in "binary not found" errors.
const MAX_LISTED_ENTRIES: usize = 20;

/// The executable taken from a verified archive, still inside the run's temp dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedBinary {
    path: PathBuf,
    archive_sha256: String,
}

impl VerifiedBinary {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Digest of the archive this binary came from.
    pub fn archive_sha256(&self) -> &str {
        &self.archive_sha256
    }
}

/// Extracts `binary_file_name` from `artifact` into `target_dir`. The entry may
/// sit at any depth in the archive; it is matched on its final path component.
pub fn extract_binary(
    artifact: &VerifiedArtifact,
    format: ArchiveFormat,
    binary_file_name: &str,
    target_dir: &Path,
) -> Result<VerifiedBinary> {
    debug!(
        "Extracting '{}' from {} ({:?}) to {}",
        binary_file_name,
        artifact.path().display(),
        format,
        target_dir.display()
    );
    fs::create_dir_all(target_dir)?;
    let dest = target_dir.join(binary_file_name);

    let search = match format {
        ArchiveFormat::TarXz => extract_from_tar_xz(artifact.path(), binary_file_name, &dest),
        ArchiveFormat::Zip => extract_from_zip(artifact.path(), binary_file_name, &dest),
    }
    .map_err(|reason| HinstError::Extraction {
        archive: artifact.file_name().to_string(),
        reason,
    })?;

    match search {
        EntrySearch::Found => {
            if !dest.is_file() {
                return Err(HinstError::Extraction {
                    archive: artifact.file_name().to_string(),
                    reason: format!(
                        "extraction completed but {} does not exist",
                        dest.display()
                    ),
                });
            }
            debug!("Extracted binary to {}", dest.display());
            Ok(VerifiedBinary {
                path: dest,
                archive_sha256: artifact.sha256().to_string(),
            })
        }
        EntrySearch::Missing { seen } => Err(HinstError::BinaryNotFoundInArchive {
            binary: binary_file_name.to_string(),
            archive: artifact.file_name().to_string(),
            entries: if seen.is_empty() {
                "no entries".to_string()
            } else {
                seen.join(", ")
            },
        }),
    }
}

enum EntrySearch {
    Found,
    Missing { seen: Vec<String> },
}

fn is_wanted(path: &Path, binary_file_name: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new(binary_file_name))
}

/// Rejects absolute paths and `..` so a crafted entry name cannot point outside
/// the archive root.
fn check_entry_path(path: &Path) -> std::result::Result<(), String> {
    for comp in path.components() {
        match comp {
            Component::Normal(_) | Component::CurDir => {}
            other => {
                error!(
                    "Disallowed/unsafe component {:?} in archive path {}",
                    other,
                    path.display()
                );
                return Err(format!("unsafe path component in {}", path.display()));
            }
        }
    }
    Ok(())
}

fn record_seen(seen: &mut Vec<String>, name: String) {
    if seen.len() < MAX_LISTED_ENTRIES {
        seen.push(name);
    } else if seen.len() == MAX_LISTED_ENTRIES {
        seen.push("...".to_string());
    }
}

fn extract_from_tar_xz(
    archive_path: &Path,
    binary_file_name: &str,
    dest: &Path,
) -> std::result::Result<EntrySearch, String> {
    let file = File::open(archive_path)
        .map_err(|e| format!("cannot open {}: {e}", archive_path.display()))?;
    let decoder = XzDecoder::new(BufReader::new(file));
    let mut archive = Archive::new(decoder);
    let mut seen = Vec::new();

    let entries = archive
        .entries()
        .map_err(|e| format!("cannot read TAR entries: {e}"))?;
    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| format!("error reading TAR entry: {e}"))?;
        let path = entry
            .path()
            .map_err(|e| format!("invalid path in TAR entry: {e}"))?
            .into_owned();
        record_seen(&mut seen, path.display().to_string());

        let is_file = matches!(
            entry.header().entry_type(),
            EntryType::Regular | EntryType::Continuous
        );
        if !is_file || !is_wanted(&path, binary_file_name) {
            continue;
        }
        check_entry_path(&path)?;
        debug!("Found {} in TAR archive at {}", binary_file_name, path.display());
        entry
            .unpack(dest)
            .map_err(|e| format!("failed to unpack {}: {e}", path.display()))?;
        return Ok(EntrySearch::Found);
    }
    Ok(EntrySearch::Missing { seen })
}

fn extract_from_zip(
    archive_path: &Path,
    binary_file_name: &str,
    dest: &Path,
) -> std::result::Result<EntrySearch, String> {
    let file = File::open(archive_path)
        .map_err(|e| format!("cannot open {}: {e}", archive_path.display()))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| format!("failed to open ZIP: {e}"))?;
    let mut seen = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("failed to read ZIP entry at index {i}: {e}"))?;
        let raw_name = entry.name().to_string();
        record_seen(&mut seen, raw_name.clone());
        if entry.is_dir() {
            continue;
        }
        // Windows archives may use backslashes.
        let path = PathBuf::from(raw_name.replace('\\', "/"));
        if !is_wanted(&path, binary_file_name) {
            continue;
        }
        check_entry_path(&path)?;
        debug!("Found {} in ZIP archive at {}", binary_file_name, raw_name);
        write_entry(&mut entry, dest).map_err(|e| format!("failed to write {raw_name}: {e}"))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                if let Err(e) = fs::set_permissions(dest, fs::Permissions::from_mode(mode)) {
                    tracing::warn!("Failed to set permissions on {}: {}", dest.display(), e);
                }
            }
        }
        return Ok(EntrySearch::Found);
    }
    Ok(EntrySearch::Missing { seen })
}

fn write_entry<R: Read>(reader: &mut R, dest: &Path) -> io::Result<u64> {
    let mut outfile = File::create(dest)?;
    io::copy(reader, &mut outfile)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use hinst_common::model::DownloadedArtifact;
    use xz2::write::XzEncoder;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::checksum::{sha256_file, verify_artifact, ChecksumManifest};

    fn tar_xz(path: &Path, files: &[(&str, &[u8])]) {
        let encoder = XzEncoder::new(File::create(path).unwrap(), 6);
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn zip_file(path: &Path, files: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn verified(path: &Path) -> VerifiedArtifact {
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        let digest = sha256_file(path).unwrap();
        let manifest = ChecksumManifest::parse(&format!("{digest}  {file_name}\n"));
        let artifact = DownloadedArtifact {
            path: path.to_path_buf(),
            file_name,
            size_bytes: fs::metadata(path).unwrap().len(),
        };
        verify_artifact(artifact, &manifest).unwrap()
    }

    #[test]
    fn extracts_nested_binary_from_tar_xz() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool-linux-amd64.tar.xz");
        tar_xz(
            &archive,
            &[
                ("tool-linux-amd64/README.md", b"docs"),
                ("tool-linux-amd64/tool", b"#!/bin/sh\necho tool\n"),
            ],
        );
        let out = dir.path().join("extracted");
        let binary =
            extract_binary(&verified(&archive), ArchiveFormat::TarXz, "tool", &out).unwrap();
        assert_eq!(binary.path(), out.join("tool"));
        assert_eq!(fs::read(binary.path()).unwrap(), b"#!/bin/sh\necho tool\n");
    }

    #[test]
    fn does_not_pick_similarly_named_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool-linux-amd64.tar.xz");
        tar_xz(&archive, &[("tool.1", b"man page"), ("mytool", b"other")]);
        let err = extract_binary(
            &verified(&archive),
            ArchiveFormat::TarXz,
            "tool",
            &dir.path().join("out"),
        )
        .unwrap_err();
        match err {
            HinstError::BinaryNotFoundInArchive { binary, entries, .. } => {
                assert_eq!(binary, "tool");
                assert!(entries.contains("tool.1"));
            }
            other => panic!("expected BinaryNotFoundInArchive, got {other:?}"),
        }
    }

    #[test]
    fn extracts_exe_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool-windows-amd64.zip");
        zip_file(&archive, &[("bin/tool.exe", b"MZ fake exe"), ("LICENSE", b"MIT")]);
        let out = dir.path().join("extracted");
        let binary =
            extract_binary(&verified(&archive), ArchiveFormat::Zip, "tool.exe", &out).unwrap();
        assert_eq!(fs::read(binary.path()).unwrap(), b"MZ fake exe");
    }

    #[test]
    fn corrupt_archive_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool-linux-amd64.tar.xz");
        fs::write(&archive, b"definitely not xz data").unwrap();
        let err = extract_binary(
            &verified(&archive),
            ArchiveFormat::TarXz,
            "tool",
            &dir.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, HinstError::Extraction { .. }), "{err:?}");
    }

    #[test]
    fn zip_format_rejects_tarball_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("tool-windows-amd64.zip");
        tar_xz(&archive, &[("tool.exe", b"x")]);
        let err = extract_binary(
            &verified(&archive),
            ArchiveFormat::Zip,
            "tool.exe",
            &dir.path().join("out"),
        )
        .unwrap_err();
        assert!(matches!(err, HinstError::Extraction { .. }), "{err:?}");
    }
}
