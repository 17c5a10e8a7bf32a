// hinst-common/src/model/mod.rs
pub mod artifact;
pub mod path_config;
pub mod platform;
pub mod release;

// Re-export
pub use artifact::{DownloadedArtifact, InstallationTarget};
pub use path_config::{
    PathConfigLocation, PathConfiguration, PathOutcome, PathReconciliationWarning,
};
pub use platform::{Arch, ArchiveFormat, Os, PlatformTarget};
pub use release::{ReleaseDescriptor, CHECKSUMS_FILE_NAME};
