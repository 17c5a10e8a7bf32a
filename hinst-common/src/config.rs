// hinst-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use tracing::debug;

use super::error::{HinstError, Result};

pub const DEFAULT_REPO: &str = "hola-sh/hola";
pub const DEFAULT_BIN_NAME: &str = "hola";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://github.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// `owner/name` of the GitHub repository publishing releases.
    pub repo: String,
    /// Name of the executable inside the release archive (without `.exe`).
    pub bin_name: String,
    /// Overrides the platform default install directory.
    pub install_dir: Option<PathBuf>,
    pub api_base_url: String,
    pub download_base_url: String,
    pub github_api_token: Option<String>,
    /// Install this tag instead of asking for the latest release.
    pub pinned_tag: Option<String>,
    pub modify_path: bool,
    /// Permit plain `http://` endpoints (local mirrors, tests).
    pub allow_insecure_urls: bool,
    /// Parent of the per-run temp dir; the system temp dir when unset.
    pub tmp_dir: Option<PathBuf>,
    pub show_progress: bool,
}

impl Config {
    /// Defaults for `repo`/`bin_name` without consulting the environment.
    pub fn new(repo: impl Into<String>, bin_name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            bin_name: bin_name.into(),
            install_dir: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            github_api_token: None,
            pinned_tag: None,
            modify_path: true,
            allow_insecure_urls: false,
            tmp_dir: None,
            show_progress: false,
        }
    }

    pub fn load() -> Result<Self> {
        debug!("Loading hinst configuration");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an environment-like lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let repo = get("HINST_REPO").unwrap_or_else(|| DEFAULT_REPO.to_string());
        let bin_name = get("HINST_BIN").unwrap_or_else(|| DEFAULT_BIN_NAME.to_string());
        let mut config = Self::new(repo, bin_name);

        config.install_dir = get("HINST_INSTALL_DIR").map(PathBuf::from);
        if let Some(url) = get("HINST_API_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = get("HINST_DOWNLOAD_URL") {
            config.download_base_url = url;
        }
        config.github_api_token = get("GITHUB_TOKEN");
        config.pinned_tag = get("HINST_VERSION");
        config.modify_path = !get("HINST_NO_MODIFY_PATH").is_some_and(|v| v == "1");
        config.tmp_dir = get("HINST_TMPDIR").map(PathBuf::from);

        debug!(
            "Configuration loaded: repo={}, bin={}, api={}, download={}",
            config.repo, config.bin_name, config.api_base_url, config.download_base_url
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_repo(&self.repo)?;
        if self.bin_name.is_empty()
            || self
                .bin_name
                .contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(HinstError::Config(format!(
                "Invalid binary name '{}'",
                self.bin_name
            )));
        }
        Ok(())
    }

    pub fn home_dir(&self) -> PathBuf {
        UserDirs::new().map_or_else(|| PathBuf::from("/"), |ud| ud.home_dir().to_path_buf())
    }

    /// Directory the binary is installed into: the explicit override, or the
    /// platform default. Always absolute; a relative override is resolved
    /// against the current directory.
    pub fn install_dir(&self) -> PathBuf {
        match &self.install_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => std::path::absolute(dir).unwrap_or_else(|e| {
                debug!("Could not resolve {}: {}", dir.display(), e);
                env::current_dir().unwrap_or_default().join(dir)
            }),
            None => self.default_install_dir(),
        }
    }

    #[cfg(windows)]
    fn default_install_dir(&self) -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| self.home_dir().join("AppData").join("Local"))
            .join("Programs")
            .join(&self.bin_name)
    }

    #[cfg(not(windows))]
    fn default_install_dir(&self) -> PathBuf {
        if is_privileged() {
            PathBuf::from("/usr/local/bin")
        } else {
            self.home_dir().join(".local").join("bin")
        }
    }

    /// Comment line that marks a profile as already configured by us.
    pub fn path_marker(&self) -> String {
        format!("# Added by hinst: {} install directory", self.bin_name)
    }

    pub fn tmp_dir(&self) -> Option<&Path> {
        self.tmp_dir.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_REPO, DEFAULT_BIN_NAME)
    }
}

/// Checks the `owner/name` shape of a GitHub repository identifier.
pub fn validate_repo(repo: &str) -> Result<()> {
    let valid_part = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    match repo.split_once('/') {
        Some((owner, name)) if valid_part(owner) && valid_part(name) => Ok(()),
        _ => Err(HinstError::Config(format!(
            "Invalid repository '{repo}': expected the form 'owner/name'"
        ))),
    }
}

#[cfg(unix)]
fn is_privileged() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(all(not(unix), not(windows)))]
fn is_privileged() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.repo, DEFAULT_REPO);
        assert_eq!(config.bin_name, DEFAULT_BIN_NAME);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.modify_path);
        assert!(config.pinned_tag.is_none());
    }

    #[test]
    fn environment_overrides_apply() {
        let config = Config::from_lookup(lookup(&[
            ("HINST_REPO", "org/tool"),
            ("HINST_BIN", "tool"),
            ("HINST_INSTALL_DIR", "/opt/tool/bin"),
            ("HINST_VERSION", "v1.2.3"),
            ("HINST_NO_MODIFY_PATH", "1"),
            ("GITHUB_TOKEN", ""),
        ]))
        .unwrap();
        assert_eq!(config.repo, "org/tool");
        assert_eq!(config.install_dir(), PathBuf::from("/opt/tool/bin"));
        assert_eq!(config.pinned_tag.as_deref(), Some("v1.2.3"));
        assert!(!config.modify_path);
        assert!(config.github_api_token.is_none());
    }

    #[test]
    fn relative_install_dir_is_made_absolute() {
        let config = Config::from_lookup(lookup(&[("HINST_INSTALL_DIR", "rel/bin")])).unwrap();
        let dir = config.install_dir();
        assert!(dir.is_absolute(), "{} should be absolute", dir.display());
        assert_eq!(dir, env::current_dir().unwrap().join("rel").join("bin"));
    }

    #[test]
    fn default_install_dir_is_absolute() {
        assert!(Config::new("org/tool", "tool").install_dir().is_absolute());
    }

    #[test]
    fn malformed_repo_is_rejected() {
        for repo in ["tool", "org/", "/tool", "org/tool/extra", "org/to ol"] {
            assert!(validate_repo(repo).is_err(), "{repo} should be rejected");
        }
        assert!(validate_repo("org-1/tool.rs_2").is_ok());
    }

    #[test]
    fn marker_names_the_binary() {
        let config = Config::new("org/tool", "tool");
        assert_eq!(config.path_marker(), "# Added by hinst: tool install directory");
    }
}
