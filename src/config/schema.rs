//! Configuration schema for binfetch
//!
//! Configuration is stored at `~/.config/binfetch/config.toml`

use crate::fetcher::{LatestDownloadSource, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Revision index settings
    pub index: IndexConfig,

    /// HTTP transport settings
    pub http: HttpConfig,

    /// Platform identity overrides
    pub platform: PlatformConfig,

    /// Local cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Revision index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base URL of the revision index API
    pub api_base: String,

    /// Which field of the newest index item is downloaded when no revision is given
    pub latest_download_source: LatestDownloadSource,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            latest_download_source: LatestDownloadSource::default(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Overall timeout per request in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            user_agent: format!("binfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Platform identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// macOS marketing name (e.g. "Big Sur"); detected when unset
    pub os_version_name: Option<String>,

    /// Current iOS SDK version used for simulator builds
    pub ios_version: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            os_version_name: None,
            ios_version: "14.0".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Override for `<checkout>/WebKitBuild/downloaded_binaries`
    pub root: Option<PathBuf>,
}
