//! Error types for repository operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`VaultorgError`].
pub type Result<T> = std::result::Result<T, VaultorgError>;

/// Errors that can occur during repository operations.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum VaultorgError {
    /// Entity was not found in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Entity already exists (cannot create duplicate).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An ensure tried to change the field the entity's id is derived from.
    #[error("natural key of {id} cannot change to {key}")]
    NaturalKeyChanged {
        /// Stored id
        id: String,
        /// Key derived from the incoming record
        key: String,
    },

    /// Name, email or title rejected before reaching the store.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Required CLI tool is not installed.
    #[error("backend CLI not installed: {0}")]
    BackendNotInstalled(String),

    /// Command execution failed (carries the tool's stderr).
    #[error("command execution failed: {0}")]
    CommandFailed(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot file could not be read or written.
    #[error("snapshot {}: {source}", path.display())]
    Persistence {
        /// Snapshot path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Backend operation failed with context.
    #[error("{backend}: {operation} {entity}: {source}")]
    BackendOperation {
        /// Backend name
        backend: String,
        /// Operation name (get, create, edit, delete, etc.)
        operation: String,
        /// Entity the operation targeted (e.g. "vault test-00")
        entity: String,
        /// Underlying error
        #[source]
        source: Box<VaultorgError>,
    },

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultorgError {
    /// Creates a backend operation error with context.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultorg::VaultorgError;
    ///
    /// let err = VaultorgError::NotFound("vault test-00".to_string());
    /// let wrapped = VaultorgError::backend_op("onepassword", "get", "vault test-00", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "onepassword: get vault test-00: not found: vault test-00"
    /// );
    /// assert!(wrapped.is_not_found());
    /// ```
    pub fn backend_op(
        backend: impl Into<String>,
        operation: impl Into<String>,
        entity: impl Into<String>,
        err: VaultorgError,
    ) -> Self {
        Self::BackendOperation {
            backend: backend.into(),
            operation: operation.into(),
            entity: entity.into(),
            source: Box::new(err),
        }
    }

    /// Returns the innermost error, skipping operation context.
    pub fn root(&self) -> &VaultorgError {
        match self {
            Self::BackendOperation { source, .. } => source.root(),
            other => other,
        }
    }

    /// True if this error (or the error it wraps) is [`VaultorgError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound(_))
    }

    /// True if this error (or the error it wraps) is [`VaultorgError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self.root(), Self::AlreadyExists(_))
    }
}
