//! Source readers: the environment-variable and file capabilities.
//!
//! The resolution engine never touches `std::env` or the filesystem directly.
//! It goes through [`ConfigEnv`] (blocking) or [`AsyncConfigEnv`]
//! (suspending), so tests can substitute [`MockEnv`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Blocking source reader.
///
/// # Example
///
/// ```
/// use loadconf::{load_config_sync_with_env, ConfigMap, MockEnv, PropertyConfig};
///
/// let env = MockEnv::new()
///     .with_env("DATABASE_URL", "postgres://localhost/app")
///     .with_file("/run/secrets/db_password", "hunter2");
///
/// let map = ConfigMap::new()
///     .property("database_url", "DATABASE_URL")
///     .property("password", PropertyConfig::file("/run/secrets/db_password"));
///
/// let values = load_config_sync_with_env(&map, &env).unwrap();
/// assert_eq!(values.get_str("password"), Some("hunter2"));
/// ```
pub trait ConfigEnv: Send + Sync {
    /// Read a file's raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the file does not exist, cannot be opened, or
    /// cannot be read.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Get an environment variable by name.
    ///
    /// Returns `None` if the variable is not set. Absence is not an error at
    /// this layer.
    fn get_env(&self, name: &str) -> Option<String>;
}

/// Suspending source reader, used by the async engine.
///
/// Implementations must behave exactly like their [`ConfigEnv`]
/// counterpart, differing only in timing.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncConfigEnv: Send + Sync {
    /// Read a file's raw bytes without blocking the executor.
    async fn read_file_async(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Get an environment variable by name.
    async fn get_env_async(&self, name: &str) -> Option<String>;
}

/// Production environment using the process environment and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl RealEnv {
    /// Create a new real environment.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigEnv for RealEnv {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn get_env(&self, name: &str) -> Option<String> {
        read_env_var(name)
    }
}

/// A set variable that is not valid Unicode is read lossily, never as unset.
fn read_env_var(name: &str) -> Option<String> {
    std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncConfigEnv for RealEnv {
    async fn read_file_async(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn get_env_async(&self, name: &str) -> Option<String> {
        read_env_var(name)
    }
}

/// Mock file state for testing.
#[derive(Debug, Clone)]
enum MockFile {
    Content(Vec<u8>),
    NotFound,
    PermissionDenied,
}

/// Mock environment for testing configuration loading.
///
/// Every lookup is recorded, so tests can assert which sources were read
/// and how often.
///
/// # Example
///
/// ```
/// use loadconf::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_file("/run/secrets/api_key", "s3cr3t")
///     .with_unreadable_file("/run/secrets/root")
///     .with_env("APP_PORT", "8080");
/// ```
#[derive(Debug, Default)]
pub struct MockEnv {
    files: RwLock<HashMap<PathBuf, MockFile>>,
    env_vars: RwLock<HashMap<String, String>>,
    accesses: Mutex<Vec<String>>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.set_file(path, content);
        self
    }

    /// Add a file that will return a "not found" error.
    pub fn with_missing_file(self, path: impl Into<PathBuf>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), MockFile::NotFound);
        self
    }

    /// Add a file that will return a "permission denied" error.
    pub fn with_unreadable_file(self, path: impl Into<PathBuf>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), MockFile::PermissionDenied);
        self
    }

    /// Set an environment variable.
    pub fn with_env(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_env(name, value);
        self
    }

    /// Set multiple environment variables from an iterator.
    pub fn with_envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env_vars = self.env_vars.write().unwrap();
        for (k, v) in vars {
            env_vars.insert(k.into(), v.into());
        }
        drop(env_vars);
        self
    }

    /// Replace a file's content after creation.
    pub fn set_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), MockFile::Content(content.into()));
    }

    /// Update an environment variable.
    pub fn set_env(&self, name: impl Into<String>, value: impl Into<String>) {
        self.env_vars
            .write()
            .unwrap()
            .insert(name.into(), value.into());
    }

    /// Remove an environment variable.
    pub fn remove_env(&self, name: &str) {
        self.env_vars.write().unwrap().remove(name);
    }

    /// Every lookup made so far, as `env:NAME` or `file:PATH`, in order.
    pub fn accesses(&self) -> Vec<String> {
        self.accesses.lock().unwrap().clone()
    }

    /// Forget recorded lookups.
    pub fn clear_accesses(&self) {
        self.accesses.lock().unwrap().clear();
    }

    fn record(&self, access: String) {
        self.accesses.lock().unwrap().push(access);
    }
}

impl ConfigEnv for MockEnv {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record(format!("file:{}", path.display()));
        let files = self.files.read().unwrap();

        match files.get(path) {
            Some(MockFile::Content(content)) => Ok(content.clone()),
            Some(MockFile::NotFound) | None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )),
            Some(MockFile::PermissionDenied) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock permission denied: {}", path.display()),
            )),
        }
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.record(format!("env:{}", name));
        self.env_vars.read().unwrap().get(name).cloned()
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncConfigEnv for MockEnv {
    async fn read_file_async(&self, path: &Path) -> io::Result<Vec<u8>> {
        ConfigEnv::read_file(self, path)
    }

    async fn get_env_async(&self, name: &str) -> Option<String> {
        ConfigEnv::get_env(self, name)
    }
}
