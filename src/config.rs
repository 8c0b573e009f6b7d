//! Configuration types for repository construction.

use crate::{Result, VaultorgError};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable selecting the backend (`fake` or `onepassword`).
pub const ENV_BACKEND: &str = "VAULTORG_BACKEND";
/// Environment variable holding the fake backend's snapshot path.
pub const ENV_FAKE_STORAGE_PATH: &str = "VAULTORG_FAKE_STORAGE_PATH";
/// Environment variable overriding the `op` binary.
pub const ENV_OP_PATH: &str = "VAULTORG_OP_PATH";
/// Environment variable holding an `op` session token.
pub const ENV_OP_SESSION: &str = "VAULTORG_OP_SESSION";

/// Repository backend identifier.
///
/// Each variant corresponds to a backend implementation enabled via a Cargo
/// feature flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    /// In-memory store persisted to a JSON snapshot (for tests)
    Fake,
    /// 1Password CLI backend (requires `op` command)
    OnePassword,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fake => write!(f, "fake"),
            Self::OnePassword => write!(f, "onepassword"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = VaultorgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fake" => Ok(Self::Fake),
            "onepassword" | "1password" | "op" => Ok(Self::OnePassword),
            _ => Err(VaultorgError::Other(anyhow::anyhow!(
                "unknown backend type: {} (valid options: fake, onepassword)",
                s
            ))),
        }
    }
}

/// Configuration for creating a repository.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use vaultorg::{Config, BackendType};
///
/// let config = Config::new(BackendType::OnePassword)
///     .with_op_path("/usr/local/bin/op")
///     .with_option("session", "token");
/// assert_eq!(config.op_path, "/usr/local/bin/op");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend type
    pub backend: BackendType,

    /// Fake-specific: snapshot file. `None` keeps state in memory only.
    pub storage_path: Option<PathBuf>,

    /// 1Password-specific: program to run (default: "op")
    pub op_path: String,

    /// Backend-specific options
    pub options: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendType::Fake,
            storage_path: None,
            op_path: "op".to_string(),
            options: HashMap::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration for the specified backend.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultorg::{Config, BackendType};
    ///
    /// let config = Config::new(BackendType::OnePassword);
    /// assert_eq!(config.backend, BackendType::OnePassword);
    /// ```
    pub fn new(backend: BackendType) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    /// Builds a configuration from `VAULTORG_*` environment variables.
    ///
    /// - `VAULTORG_BACKEND`: `fake` or `onepassword` (default: `onepassword`)
    /// - `VAULTORG_FAKE_STORAGE_PATH`: snapshot file for the fake backend
    /// - `VAULTORG_OP_PATH`: `op` binary (default: `op`)
    /// - `VAULTORG_OP_SESSION`: session token exported to `op` as `OP_SESSION`
    ///
    /// # Errors
    ///
    /// Fails if `VAULTORG_BACKEND` names an unknown backend.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup(ENV_BACKEND) {
            Some(value) => value.parse()?,
            None => BackendType::OnePassword,
        };

        let mut config = Self::new(backend);
        if let Some(path) = lookup(ENV_FAKE_STORAGE_PATH) {
            config = config.with_storage_path(path);
        }
        if let Some(op) = lookup(ENV_OP_PATH) {
            config = config.with_op_path(op);
        }
        if let Some(session) = lookup(ENV_OP_SESSION) {
            config = config.with_option("session", session);
        }

        Ok(config)
    }

    /// Sets the snapshot path (fake backend only).
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Sets the `op` program (1Password backend only).
    pub fn with_op_path(mut self, path: impl Into<String>) -> Self {
        self.op_path = path.into();
        self
    }

    /// Adds a backend-specific option.
    ///
    /// **1Password:**
    /// - `session`: session token, exported to `op` as `OP_SESSION`
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Gets a backend-specific option value.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }
}
