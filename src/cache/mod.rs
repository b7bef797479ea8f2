//! Local layout of downloaded binaries
//!
//! ```text
//! <checkout>/WebKitBuild/downloaded_binaries/
//!     mac-bigsur-x86_64-release/
//!         271234/            complete extraction
//!         .271240.<id>.tmp/  extraction in progress
//!         271240.zip         download in progress
//! ```
//!
//! Only directories without a leading dot are complete cache entries.

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker identifying the root of a checkout
const CHECKOUT_MARKER: [&str; 3] = ["Tools", "Scripts", "webkitpy"];

/// A completed cache entry
#[derive(Debug, Clone, Serialize)]
pub struct CachedBuild {
    /// Cache key, e.g. `mac-bigsur-x86_64-release`
    pub key: String,
    /// Revision directory name
    pub revision: String,
    /// Full path of the extracted binaries
    pub path: PathBuf,
    /// Last modification time of the revision directory
    pub modified: Option<DateTime<Utc>>,
}

/// Walk up from `start` to the first directory containing `Tools/Scripts/webkitpy`
pub fn find_checkout_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            CHECKOUT_MARKER
                .iter()
                .fold(dir.to_path_buf(), |path, part| path.join(part))
                .is_dir()
        })
        .map(Path::to_path_buf)
}

/// `<checkout>/WebKitBuild/downloaded_binaries`
pub fn downloaded_binaries_dir(checkout: &Path) -> PathBuf {
    checkout.join("WebKitBuild").join("downloaded_binaries")
}

/// Resolve where binaries are cached.
///
/// `cache.root` from the config wins; otherwise the checkout is `checkout`
/// when given, else discovered from `cwd`.
pub fn resolve_root(
    config: &Config,
    checkout: Option<&Path>,
    cwd: &Path,
) -> FetchResult<PathBuf> {
    if let Some(root) = &config.cache.root {
        debug!("Using configured cache root {}", root.display());
        return Ok(root.clone());
    }

    let checkout = match checkout {
        Some(dir) => dir.to_path_buf(),
        None => find_checkout_root(cwd)
            .ok_or_else(|| FetchError::CheckoutNotFound(cwd.to_path_buf()))?,
    };
    debug!("Using checkout {}", checkout.display());
    Ok(downloaded_binaries_dir(&checkout))
}

/// List completed cache entries under `root`, sorted by key then revision.
///
/// A missing root yields an empty list.
pub fn list_cached(root: &Path) -> FetchResult<Vec<CachedBuild>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut builds = Vec::new();
    for key_dir in read_visible_dirs(root)? {
        let key = file_name(&key_dir);
        for revision_dir in read_visible_dirs(&key_dir)? {
            let modified = fs::metadata(&revision_dir)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            builds.push(CachedBuild {
                key: key.clone(),
                revision: file_name(&revision_dir),
                path: revision_dir,
                modified,
            });
        }
    }

    builds.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.revision.cmp(&b.revision)));
    debug!("Found {} cached builds under {}", builds.len(), root.display());
    Ok(builds)
}

fn read_visible_dirs(dir: &Path) -> FetchResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| FetchError::io(format!("reading {}", dir.display()), e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FetchError::io(format!("reading {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_dir() && !file_name(&path).starts_with('.') {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
