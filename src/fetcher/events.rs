//! Progress events reported while fetching

use std::path::PathBuf;

/// Progress of a `get_path` call, delivered to an optional observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A complete cache directory already exists
    CacheHit { path: PathBuf },
    /// Requesting the revision index
    QueryingIndex { url: String },
    /// A revision was chosen from the index
    RevisionSelected { revision: String, download_url: String },
    /// Archive download began
    DownloadStarted {
        url: String,
        total_bytes: Option<u64>,
    },
    /// Bytes written to the local archive so far
    DownloadProgress { bytes: u64 },
    /// Archive download finished, extraction starting
    Extracting { archive: PathBuf },
    /// Binaries are extracted and ready
    Ready { path: PathBuf },
}
