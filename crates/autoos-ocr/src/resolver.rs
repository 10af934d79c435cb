use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use autoos_config::acquisition::AcquisitionConfig;
use autoos_types::{DependencyState, InstallRecord};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::acquire::{Downloader, HttpDownloader, Installer, SilentInstaller};
use crate::bounded::bounded;
use crate::error::{Error, Result};
use crate::path_env::{PathEnvironment, ProcessPath};

/// Makes sure the OCR engine can be invoked by name, installing it if allowed.
///
/// Nothing happens until [`DependencyResolver::ensure`] is called. The resolver
/// owns the dependency state for its lifetime; hosts keep one per process.
pub struct DependencyResolver {
    config: AcquisitionConfig,
    path_env: Arc<dyn PathEnvironment>,
    downloader: Arc<dyn Downloader>,
    installer: Arc<dyn Installer>,
    cancel: CancellationToken,
    span: tracing::Span,
    /// The packaged installer is a Windows executable
    installer_platform: bool,

    state: DependencyState,
    executable: Option<PathBuf>,
    record: Option<InstallRecord>,
    last_error: Option<Error>,
}

impl DependencyResolver {
    pub fn new(config: AcquisitionConfig) -> Self {
        let span = tracing::info_span!("dependency_resolver", engine = %config.executable_name);

        Self {
            config,
            path_env: Arc::new(ProcessPath::new()),
            downloader: Arc::new(HttpDownloader::new()),
            installer: Arc::new(SilentInstaller),
            cancel: CancellationToken::new(),
            span,
            installer_platform: cfg!(windows),
            state: DependencyState::Unknown,
            executable: None,
            record: None,
            last_error: None,
        }
    }

    pub fn with_path_environment(mut self, path_env: Arc<dyn PathEnvironment>) -> Self {
        self.path_env = path_env;
        self
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = installer;
        self
    }

    /// Cancelling the token aborts an in-flight download or install
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_installer_platform(mut self, supported: bool) -> Self {
        self.installer_platform = supported;
        self
    }

    pub fn state(&self) -> DependencyState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == DependencyState::Verified
    }

    /// Resolved engine executable, only while verified
    pub fn executable(&self) -> Option<&Path> {
        if self.is_ready() {
            self.executable.as_deref()
        } else {
            None
        }
    }

    pub fn install_record(&self) -> Option<&InstallRecord> {
        self.record.as_ref()
    }

    /// Why the most recent `ensure` returned false
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn path_environment(&self) -> &Arc<dyn PathEnvironment> {
        &self.path_env
    }

    /// Cheap lookups first, then at most one acquisition attempt.
    /// A failed call may simply be repeated; it starts over from the lookups.
    pub async fn ensure(&mut self) -> bool {
        let span = self.span.clone();
        self.ensure_inner().instrument(span).await
    }

    async fn ensure_inner(&mut self) -> bool {
        self.last_error = None;

        if self.state == DependencyState::Failed {
            self.transition(DependencyState::Missing);
        }

        if let Some(executable) = self.executable()
            && executable.is_file()
        {
            tracing::debug!("Engine already verified at {}", executable.display());
            return true;
        }

        if let Some(executable) = self.lookup() {
            tracing::info!("Tesseract is available at {}", executable.display());
            self.executable = Some(executable);
            self.transition(DependencyState::Verified);
            return true;
        }

        self.executable = None;
        self.transition(DependencyState::Missing);

        if !self.installer_platform {
            tracing::error!("Tesseract not found and auto-install is not supported on this platform");
            return self.fail(Error::DependencyUnavailable);
        }

        if !self.config.acquire_missing {
            tracing::error!("Tesseract not found and auto-install is disabled");
            return self.fail(Error::DependencyUnavailable);
        }

        match self.acquire().await {
            Ok(record) => {
                tracing::info!(
                    "Tesseract installed at {} and added to PATH",
                    record.executable_path.display()
                );
                self.executable = Some(record.executable_path.clone());
                self.record = Some(record);
                self.transition(DependencyState::Verified);
                true
            }
            Err(e) => {
                tracing::error!("Tesseract could not be installed or found: {}", e);
                self.fail(e)
            }
        }
    }

    /// Steps that never touch the network: search path, known locations, system directory
    fn lookup(&self) -> Option<PathBuf> {
        let name = &self.config.executable_name;

        if let Some(found) = self.path_env.find_executable(name) {
            return Some(found);
        }

        for candidate in &self.config.fallback_executables {
            if let Some(found) = self.try_directory_of(candidate) {
                tracing::info!("Tesseract found after updating PATH");
                return Some(found);
            }
        }

        let secondary = self.config.secondary_directory.as_ref()?;
        let found = self.try_directory_of(&secondary.join(name))?;
        tracing::info!("Tesseract found after adding {} to PATH", secondary.display());
        Some(found)
    }

    /// If `candidate` exists, put its directory on the search path and look again
    fn try_directory_of(&self, candidate: &Path) -> Option<PathBuf> {
        if !candidate.is_file() {
            tracing::debug!("No engine at {}", candidate.display());
            return None;
        }

        let directory = candidate.parent()?;
        if let Err(e) = self.path_env.prepend(directory) {
            tracing::warn!("Failed to add {} to PATH: {}", directory.display(), e);
            return None;
        }

        self.path_env.find_executable(&self.config.executable_name)
    }

    async fn acquire(&mut self) -> Result<InstallRecord> {
        let install_dir = std::path::absolute(&self.config.install_dir)
            .unwrap_or_else(|_| self.config.install_dir.clone());
        let executable = install_dir.join(&self.config.executable_name);

        if executable.is_file() {
            tracing::info!("Tesseract already installed at {}", install_dir.display());
            return self.verify_install(&install_dir, &executable, None);
        }

        self.transition(DependencyState::Installing);

        let url = self.config.installer_url.clone();
        let artifact = self
            .config
            .download_dir
            .join(format!("tesseract-installer-{}.exe", Uuid::new_v4()));

        let outcome = self.download_and_install(&url, &artifact, &install_dir).await;
        remove_artifact(&artifact).await;
        outcome?;

        self.verify_install(&install_dir, &executable, Some(url))
    }

    async fn download_and_install(&self, url: &str, artifact: &Path, install_dir: &Path) -> Result<()> {
        tracing::info!("Downloading Tesseract installer from {} ...", url);
        let bytes = bounded(
            "download",
            self.config.download_timeout(),
            &self.cancel,
            self.downloader.download(url, artifact),
        )
        .await?;

        tracing::info!("Running Tesseract installer (silent, {} bytes)...", bytes);
        let code = self
            .installer
            .install(artifact, install_dir, self.config.install_timeout(), &self.cancel)
            .await?;

        if code != 0 {
            return Err(Error::InstallFailed(format!(
                "installer exited with code {code}"
            )));
        }

        Ok(())
    }

    fn verify_install(
        &self,
        install_dir: &Path,
        executable: &Path,
        source_url: Option<String>,
    ) -> Result<InstallRecord> {
        if !executable.is_file() {
            return Err(Error::InstallFailed(format!(
                "{} not found after install",
                executable.display()
            )));
        }

        self.path_env.prepend(install_dir)?;

        let executable_path = self
            .path_env
            .find_executable(&self.config.executable_name)
            .ok_or_else(|| {
                Error::InstallFailed(format!(
                    "{} is not reachable through PATH",
                    self.config.executable_name
                ))
            })?;

        Ok(InstallRecord {
            install_directory: install_dir.to_path_buf(),
            executable_path,
            source_url,
            verified_at: SystemTime::now(),
        })
    }

    fn fail(&mut self, error: Error) -> bool {
        self.last_error = Some(error);
        self.transition(DependencyState::Failed);
        false
    }

    fn transition(&mut self, next: DependencyState) {
        if self.state != next {
            tracing::debug!("Dependency state {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

const REMOVE_ATTEMPTS: u32 = 5;
const REMOVE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// The installer is never left behind, whatever the outcome.
/// Windows may hold the file briefly after its process exits, so removal is retried.
async fn remove_artifact(artifact: &Path) {
    for attempt in 1..=REMOVE_ATTEMPTS {
        match tokio::fs::remove_file(artifact).await {
            Ok(()) => {
                tracing::debug!("Removed {}", artifact.display());
                return;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) if attempt < REMOVE_ATTEMPTS => {
                tracing::debug!("Removing {} failed ({}), retrying", artifact.display(), e);
                tokio::time::sleep(REMOVE_RETRY_DELAY).await;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", artifact.display(), e),
        }
    }
}
