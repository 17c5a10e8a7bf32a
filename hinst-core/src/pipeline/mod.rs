// hinst-core/src/pipeline/mod.rs
// Drives one install run from platform detection to PATH reconciliation.

use std::ffi::OsString;

use hinst_aio::checksum::{verify_artifact, ChecksumManifest};
use hinst_aio::extract::extract_binary;
use hinst_aio::fs::ScopedTempDir;
use hinst_common::config::Config;
use hinst_common::error::{HinstError, Result, StepError};
use hinst_common::model::{InstallationTarget, PlatformTarget, CHECKSUMS_FILE_NAME};
use hinst_common::pipeline::{InstallReport, InstallStep, RunState};
use hinst_net::http::{build_http_client, download_to_file, fetch_checksum_manifest};
use hinst_net::release::resolve_release;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::install::install_binary;
use crate::path_config::{default_reconciler, reconcile, PathReconciler};
use crate::platform::resolve_platform;

const EXTRACT_DIR_NAME: &str = "extracted";

/// Owns everything one run needs. Steps hand their outputs to the next step
/// explicitly; nothing is shared through globals.
pub struct Installer {
    config: Config,
    client: Client,
    reconciler: Box<dyn PathReconciler>,
    platform: Option<PlatformTarget>,
    session_path: Option<OsString>,
}

impl Installer {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = build_http_client()?;
        let reconciler = default_reconciler(&config);
        Ok(Self {
            config,
            client,
            reconciler,
            platform: None,
            session_path: std::env::var_os("PATH"),
        })
    }

    pub fn with_path_reconciler(mut self, reconciler: Box<dyn PathReconciler>) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Installs for `platform` instead of the detected host.
    pub fn with_platform(mut self, platform: PlatformTarget) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Overrides the `PATH` value the on-PATH check runs against.
    pub fn with_session_path(mut self, path: impl Into<OsString>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    #[instrument(skip_all, name = "install_run", fields(repo = %self.config.repo))]
    pub async fn run(&self) -> std::result::Result<InstallReport, StepError> {
        let result = self.run_steps().await;
        if let Err(e) = &result {
            error!("Install run ended in {:?}: {}", RunState::Failed, e);
        }
        result
    }

    async fn run_steps(&self) -> std::result::Result<InstallReport, StepError> {
        let config = &self.config;
        let mut state = RunState::Start;

        let platform = match self.platform {
            Some(platform) => platform,
            None => resolve_platform().map_err(at(InstallStep::ResolvePlatform))?,
        };
        state = advance(state, InstallStep::ResolvePlatform);

        info!("Resolving release of {} for {}", config.repo, platform);
        let release = resolve_release(&self.client, config, &platform)
            .await
            .map_err(at(InstallStep::ResolveRelease))?;
        state = advance(state, InstallStep::ResolveRelease);

        // Dropping the guard removes every file below on all exit paths.
        let temp = ScopedTempDir::create(config.tmp_dir()).map_err(at(InstallStep::Download))?;

        info!("Downloading {}", release.archive_url);
        let artifact = download_to_file(
            &self.client,
            &release.archive_url,
            &temp.join(&release.archive_name),
            config.allow_insecure_urls,
            config.show_progress,
        )
        .await
        .map_err(at(InstallStep::Download))?;
        state = advance(state, InstallStep::Download);

        info!("Verifying checksum of {}", artifact.file_name);
        let manifest_text = fetch_checksum_manifest(
            &self.client,
            &release.checksums_url,
            &temp.join(CHECKSUMS_FILE_NAME),
            config.allow_insecure_urls,
        )
        .await
        .map_err(at(InstallStep::VerifyChecksum))?;
        let manifest = ChecksumManifest::parse(&manifest_text);
        let verified =
            verify_artifact(artifact, &manifest).map_err(at(InstallStep::VerifyChecksum))?;
        state = advance(state, InstallStep::VerifyChecksum);

        let binary_file_name = platform.binary_file_name(&config.bin_name);
        let binary = extract_binary(
            &verified,
            platform.archive_format(),
            &binary_file_name,
            &temp.join(EXTRACT_DIR_NAME),
        )
        .map_err(at(InstallStep::Extract))?;
        state = advance(state, InstallStep::Extract);

        let target = InstallationTarget::new(config.install_dir(), &binary_file_name);
        info!("Installing to {}", target.binary_path().display());
        let replaced_existing =
            install_binary(&binary, &target).map_err(at(InstallStep::Install))?;
        state = advance(state, InstallStep::Install);

        let (path_outcome, warnings) = reconcile(
            self.reconciler.as_ref(),
            target.dir(),
            self.session_path.as_deref(),
            config.modify_path,
        );
        let state = advance(state, InstallStep::ReconcilePath);

        if let Err(e) = temp.close() {
            warn!("Temporary files were not fully removed: {}", e);
        }
        debug!("Run state: {:?} -> {:?}", state, RunState::Done);

        Ok(InstallReport {
            tag: release.tag,
            platform,
            installed_path: target.binary_path().to_path_buf(),
            sha256: binary.archive_sha256().to_string(),
            replaced_existing,
            path_outcome,
            warnings,
            final_state: RunState::Done,
        })
    }
}

fn at(step: InstallStep) -> impl FnOnce(HinstError) -> StepError {
    move |source| StepError::new(step, source)
}

fn advance(state: RunState, completed: InstallStep) -> RunState {
    let next = state.advance(completed);
    debug!("Run state: {:?} -> {:?}", state, next);
    next
}
