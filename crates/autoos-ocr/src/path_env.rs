use std::env;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;

/// Serializes every read-modify-write of process environment variables
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ordered executable search path without duplicate directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
    case_insensitive: bool,
}

impl SearchPath {
    /// Directory comparison follows the platform: case-insensitive on Windows
    pub fn platform_case_insensitive() -> bool {
        cfg!(windows)
    }

    pub fn new(case_insensitive: bool) -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive,
        }
    }

    /// Split a delimiter-joined path string. Later duplicates are dropped,
    /// since the first occurrence is the one lookups resolve to anyway.
    pub fn parse(raw: &OsStr, case_insensitive: bool) -> Self {
        Self::from_entries(env::split_paths(raw), case_insensitive)
    }

    pub fn from_entries<I, P>(entries: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut path = Self::new(case_insensitive);
        for entry in entries {
            let entry = entry.into();
            if entry.as_os_str().is_empty() || path.contains(&entry) {
                continue;
            }
            path.entries.push(entry);
        }
        path
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn contains(&self, directory: &Path) -> bool {
        let wanted = self.comparable(directory);
        self.entries.iter().any(|e| self.comparable(e) == wanted)
    }

    /// Insert at the front. Returns false when already present.
    pub fn prepend(&mut self, directory: impl Into<PathBuf>) -> bool {
        let directory = directory.into();
        if self.contains(&directory) {
            return false;
        }
        self.entries.insert(0, directory);
        true
    }

    /// First `<entry>/<name>` that is an existing file
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.entries
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn to_os_string(&self) -> io::Result<OsString> {
        env::join_paths(&self.entries).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }

    /// Key used for equality: trailing separators dropped, case folded when
    /// the platform ignores case. Non-UTF-8 paths compare by their raw bytes.
    fn comparable(&self, directory: &Path) -> Vec<u8> {
        let raw = directory.as_os_str();
        let mut key = match raw.to_str() {
            Some(text) if self.case_insensitive => text.to_lowercase().into_bytes(),
            _ => raw.as_encoded_bytes().to_vec(),
        };

        let separators: &[u8] = if cfg!(windows) { b"\\/" } else { b"/" };
        while key.len() > 1 && key.last().is_some_and(|b| separators.contains(b)) {
            key.pop();
        }
        key
    }
}

/// The search path visible to this process and the children it spawns
pub trait PathEnvironment: Send + Sync {
    fn snapshot(&self) -> SearchPath;

    /// Add `directory` at highest priority and commit immediately.
    /// No-op returning `Ok(false)` when it is already listed.
    fn prepend(&self, directory: &Path) -> Result<bool>;

    fn contains(&self, directory: &Path) -> bool {
        self.snapshot().contains(directory)
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.snapshot().find_executable(name)
    }
}

/// Backed by a real environment variable, `PATH` unless told otherwise.
///
/// `prepend` mutates the process environment. Call it (through
/// `DependencyResolver::ensure`) while no other thread is inside non-Rust code
/// that reads the environment, such as `getaddrinfo`.
pub struct ProcessPath {
    variable: String,
    case_insensitive: bool,
}

impl ProcessPath {
    pub fn new() -> Self {
        Self::with_variable("PATH")
    }

    pub fn with_variable(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            case_insensitive: SearchPath::platform_case_insensitive(),
        }
    }

    fn read(&self) -> SearchPath {
        let raw = env::var_os(&self.variable).unwrap_or_default();
        SearchPath::parse(&raw, self.case_insensitive)
    }
}

impl Default for ProcessPath {
    fn default() -> Self {
        Self::new()
    }
}

impl PathEnvironment for ProcessPath {
    fn snapshot(&self) -> SearchPath {
        let _guard = env_lock();
        self.read()
    }

    fn prepend(&self, directory: &Path) -> Result<bool> {
        let _guard = env_lock();
        let mut path = self.read();
        if !path.prepend(directory) {
            return Ok(false);
        }

        let joined = path.to_os_string()?;
        // SAFETY: every mutation made by this crate holds ENV_LOCK, so writers never overlap.
        // Commits happen between acquisition steps, after the download has finished and
        // before any OCR child starts, so none of this crate's threads are reading the
        // environment. Hosts must not read it from foreign code while `ensure` runs.
        unsafe {
            env::set_var(&self.variable, joined);
        }
        tracing::info!("Added {} to {}", directory.display(), self.variable);
        Ok(true)
    }
}

/// In-memory search path for embedding hosts and tests
pub struct MemoryPath {
    path: Mutex<SearchPath>,
}

impl MemoryPath {
    pub fn new(path: SearchPath) -> Self {
        Self {
            path: Mutex::new(path),
        }
    }

    pub fn empty() -> Self {
        Self::new(SearchPath::new(SearchPath::platform_case_insensitive()))
    }

    fn lock(&self) -> MutexGuard<'_, SearchPath> {
        self.path.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PathEnvironment for MemoryPath {
    fn snapshot(&self) -> SearchPath {
        self.lock().clone()
    }

    fn prepend(&self, directory: &Path) -> Result<bool> {
        Ok(self.lock().prepend(directory))
    }
}
