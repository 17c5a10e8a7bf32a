// hinst-core/src/lib.rs

pub mod install;
pub mod path_config;
pub mod pipeline;
pub mod platform;

pub use install::install_binary;
pub use path_config::{PathReconciler, ShellProfileReconciler, UserEnvReconciler};
pub use pipeline::Installer;
pub use platform::resolve_platform;
