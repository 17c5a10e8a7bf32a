// hinst-aio/src/lib.rs
//! Checksum, archive and filesystem primitives for hinst

pub mod checksum;
pub mod extract;
pub mod fs;

pub use checksum::{verify_artifact, ChecksumManifest, VerifiedArtifact};
pub use extract::{extract_binary, VerifiedBinary};
pub use fs::ScopedTempDir;
