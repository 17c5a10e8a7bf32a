// hinst-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

// Re-export key types
pub use config::Config;
pub use error::{HinstError, Result, StepError};
pub use model::{PlatformTarget, ReleaseDescriptor};
pub use pipeline::{InstallReport, InstallStep, RunState};
