// hinst/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use hinst_common::config::Config;
use hinst_common::error::Result;

pub mod summary;

/// Download, verify and install the latest release of hola.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "hinst", bin_name = "hinst")]
pub struct CliArgs {
    /// More output (-v debug, -vv trace). HINST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// GitHub repository to install from, as owner/name [env: HINST_REPO]
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Name of the executable inside the release archive [env: HINST_BIN]
    #[arg(long = "bin", value_name = "NAME")]
    pub bin_name: Option<String>,

    /// Install into this directory instead of the platform default [env: HINST_INSTALL_DIR]
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Install this release tag instead of the latest one [env: HINST_VERSION]
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Never edit shell profiles or the user environment [env: HINST_NO_MODIFY_PATH=1]
    #[arg(long)]
    pub no_modify_path: bool,

    /// Base URL of the GitHub API [env: HINST_API_URL]
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Base URL release assets are downloaded from [env: HINST_DOWNLOAD_URL]
    #[arg(long, value_name = "URL")]
    pub download_url: Option<String>,

    /// Allow plain http:// URLs (local mirrors only)
    #[arg(long)]
    pub allow_insecure: bool,

    /// Do not draw a download progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl CliArgs {
    /// Overlays the flags that were given on top of `config`.
    pub fn apply_to(&self, mut config: Config) -> Result<Config> {
        if let Some(repo) = &self.repo {
            config.repo = repo.clone();
        }
        if let Some(bin_name) = &self.bin_name {
            config.bin_name = bin_name.clone();
        }
        if let Some(dir) = &self.install_dir {
            config.install_dir = Some(dir.clone());
        }
        if let Some(tag) = &self.tag {
            config.pinned_tag = Some(tag.clone());
        }
        if self.no_modify_path {
            config.modify_path = false;
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(url) = &self.download_url {
            config.download_base_url = url.clone();
        }
        config.allow_insecure_urls |= self.allow_insecure;
        if self.no_progress {
            config.show_progress = false;
        }
        config.validate()?;
        Ok(config)
    }
}
