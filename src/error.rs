//! Error types for binfetch
//!
//! All modules use `FetchResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for binfetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// All errors that can occur while resolving, downloading or staging binaries
#[derive(Error, Debug)]
pub enum FetchError {
    // Target errors
    #[error("Downloading binaries for the {0} port is not currently supported")]
    UnsupportedPlatform(String),

    #[error("Could not determine OS version: {0}")]
    OsVersionUnknown(String),

    #[error("Invalid iOS version '{value}': {reason}")]
    InvalidIosVersion { value: String, reason: String },

    // Index errors
    #[error("No build revisions found at: {url}")]
    NoRevisionsFound { url: String },

    #[error("Could not find revision {revision} for the constructed API path: {url}")]
    RevisionNotFound { revision: String, url: String },

    #[error("Revision '{0}' is not a valid cache directory name")]
    InvalidRevision(String),

    #[error("Malformed revision index from {url}: {reason}")]
    IndexMalformed { url: String, reason: String },

    // Transfer errors
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    // Checkout errors
    #[error("No WebKit checkout found above {0}")]
    CheckoutNotFound(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl FetchError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a download error for a URL
    pub fn download(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a corrupt archive error
    pub fn corrupt_archive(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedPlatform(_) => Some("Supported ports: mac, ios-simulator"),
            Self::OsVersionUnknown(_) => {
                Some("Set platform.os_version_name in the config, e.g. \"Big Sur\"")
            }
            Self::Download { .. } => {
                Some("Internet connectivity is required to fetch build binaries")
            }
            Self::CheckoutNotFound(_) => Some("Pass --checkout or set cache.root in the config"),
            Self::InvalidRevision(_) => Some("Revisions are plain identifiers such as 271234"),
            Self::RevisionNotFound { .. } => {
                Some("The index only lists recent builds; omit --revision to use the latest")
            }
            _ => None,
        }
    }
}
