//! Scenario tests driving the resolver and locator through fake collaborators

mod pipeline_tests;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoos_config::acquisition::AcquisitionConfig;
use autoos_types::OcrToken;
use image::RgbaImage;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::acquire::{Downloader, Installer};
use crate::bounded::bounded;
use crate::error::{Error, Result};
use crate::path_env::{MemoryPath, SearchPath};
use crate::recognizer::TextRecognizer;
use crate::resolver::DependencyResolver;

pub(crate) const EXE: &str = "tesseract-test";
pub(crate) const URL: &str = "https://example.invalid/tesseract-setup.exe";

/// Writes a few bytes wherever it is told to, or fails
#[derive(Default)]
pub(crate) struct FakeDownloader {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub destinations: Mutex<Vec<PathBuf>>,
}

#[async_trait::async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.destinations
            .lock()
            .unwrap()
            .push(destination.to_path_buf());

        if self.fail {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                reason: "connection reset".into(),
            });
        }

        tokio::fs::write(destination, b"MZ-fake-installer").await?;
        Ok(17)
    }
}

/// Exits with a configurable code, optionally dropping the engine into the target
pub(crate) struct FakeInstaller {
    pub calls: AtomicUsize,
    pub exit_code: AtomicI32,
    pub create_executable: bool,
    pub saw_artifact: Mutex<Vec<bool>>,
    /// Never exits on its own; stopped when the limit or cancellation hits
    pub hangs: bool,
    /// Whether the package was still on disk when the hung run was stopped
    pub artifact_at_stop: Mutex<Vec<bool>>,
}

impl FakeInstaller {
    pub fn exiting(code: i32, create_executable: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            exit_code: AtomicI32::new(code),
            create_executable,
            saw_artifact: Mutex::new(Vec::new()),
            hangs: false,
            artifact_at_stop: Mutex::new(Vec::new()),
        }
    }

    pub fn hanging() -> Self {
        Self {
            hangs: true,
            ..Self::exiting(0, true)
        }
    }
}

#[async_trait::async_trait]
impl Installer for FakeInstaller {
    async fn install(
        &self,
        installer: &Path,
        target_dir: &Path,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> Result<i32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saw_artifact.lock().unwrap().push(installer.is_file());

        if self.hangs {
            let result = bounded("install", limit, cancel, std::future::pending::<Result<i32>>()).await;
            self.artifact_at_stop.lock().unwrap().push(installer.is_file());
            return result;
        }

        let code = self.exit_code.load(Ordering::SeqCst);
        if code == 0 && self.create_executable {
            place_executable(target_dir);
        }
        Ok(code)
    }
}

/// Returns canned tokens and text
#[derive(Default)]
pub(crate) struct FakeRecognizer {
    pub tokens: Vec<OcrToken>,
    pub text: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(&self, _engine: &Path, _image: &RgbaImage) -> Result<Vec<OcrToken>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::OcrInvocationFailed("engine crashed".into()));
        }
        Ok(self.tokens.clone())
    }

    async fn read_text(&self, _engine: &Path, _image: &RgbaImage) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

pub(crate) fn place_executable(dir: &Path) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let exe = dir.join(EXE);
    std::fs::write(&exe, b"").unwrap();
    exe
}

/// Temp directory layout plus fakes shared by the acquisition scenarios
pub(crate) struct Fixture {
    pub root: TempDir,
    pub path: Arc<MemoryPath>,
    pub downloader: Arc<FakeDownloader>,
    pub installer: Arc<FakeInstaller>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(FakeDownloader::default(), FakeInstaller::exiting(0, true))
    }

    pub fn with(downloader: FakeDownloader, installer: FakeInstaller) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("downloads")).unwrap();

        Self {
            root,
            path: Arc::new(MemoryPath::new(SearchPath::new(false))),
            downloader: Arc::new(downloader),
            installer: Arc::new(installer),
        }
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            executable_name: EXE.to_string(),
            fallback_executables: vec![self.dir("known").join(EXE)],
            secondary_directory: Some(self.dir("system")),
            install_dir: self.dir("install"),
            installer_url: URL.to_string(),
            download_dir: self.dir("downloads"),
            download_timeout_seconds: 5,
            install_timeout_seconds: 5,
            acquire_missing: true,
        }
    }

    pub fn resolver(&self) -> DependencyResolver {
        self.resolver_with(self.config())
    }

    pub fn resolver_with(&self, config: AcquisitionConfig) -> DependencyResolver {
        DependencyResolver::new(config)
            .with_installer_platform(true)
            .with_path_environment(self.path.clone())
            .with_downloader(self.downloader.clone())
            .with_installer(self.installer.clone())
    }

    pub fn downloads(&self) -> usize {
        self.downloader.calls.load(Ordering::SeqCst)
    }

    pub fn installs(&self) -> usize {
        self.installer.calls.load(Ordering::SeqCst)
    }

    /// Files left in the download directory
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(self.dir("downloads")).unwrap().count()
    }
}
