use std::fmt;

/// Errors surfaced by the gate to the host framework.
///
/// Any of these aborts the in-flight request. A failed forced deletion must
/// not leave the account with a usable session, so storage failures are
/// never swallowed.
#[derive(Debug)]
pub enum Error {
    /// Ending the account's sessions failed
    Logout {
        /// Account being cleaned up
        account_id: u64,
        /// Underlying storage failure
        source: StorageError,
    },
    /// Loading the user record failed
    Load {
        /// Account being cleaned up
        account_id: u64,
        /// Underlying storage failure
        source: StorageError,
    },
    /// Deleting the user record failed
    Delete {
        /// Account being cleaned up
        account_id: u64,
        /// Underlying storage failure
        source: StorageError,
    },
    /// The redirect response could not be built
    Response(http::Error),
    /// The gate configuration is invalid
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Logout { account_id, source } => {
                write!(f, "failed to end sessions of account {}: {}", account_id, source)
            }
            Error::Load { account_id, source } => {
                write!(f, "failed to load account {}: {}", account_id, source)
            }
            Error::Delete { account_id, source } => {
                write!(f, "failed to delete account {}: {}", account_id, source)
            }
            Error::Response(e) => write!(f, "failed to build redirect response: {}", e),
            Error::Config(e) => write!(f, "invalid gate configuration: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Logout { source, .. }
            | Error::Load { source, .. }
            | Error::Delete { source, .. } => Some(source),
            Error::Response(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::Response(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Failure reported by a session or user storage backend.
///
/// # Examples
///
/// ```
/// use auth_gate::{StorageError, StorageErrorKind};
///
/// let error = StorageError::with_message(StorageErrorKind::Unavailable, "db down");
/// assert_eq!(error.kind(), StorageErrorKind::Unavailable);
/// assert_eq!(error.to_string(), "storage error (backend unavailable): db down");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    kind: StorageErrorKind,
    message: Option<String>,
}

impl StorageError {
    /// Creates a storage error of the given kind.
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a storage error with a backend-specific message.
    pub fn with_message(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Returns the message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "storage error ({}): {}", self.kind, msg),
            None => write!(f, "storage error ({})", self.kind),
        }
    }
}

impl std::error::Error for StorageError {}

/// Kind of storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The backend could not be reached
    Unavailable,
    /// The backend rejected or failed the operation
    Backend,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "backend unavailable"),
            Self::Backend => write!(f, "backend failure"),
        }
    }
}

/// A rejected gate configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The baseline role name is empty
    EmptyBaselineRole,
    /// A local redirect target is not an absolute, same-origin path
    InvalidLocalTarget(String),
    /// A trusted redirect target is not an absolute http(s) URL
    InvalidTrustedTarget(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyBaselineRole => write!(f, "baseline role must not be empty"),
            ConfigError::InvalidLocalTarget(t) => {
                write!(f, "local redirect target '{}' must be an absolute path", t)
            }
            ConfigError::InvalidTrustedTarget(t) => {
                write!(f, "trusted redirect target '{}' must be an absolute http(s) URL", t)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
