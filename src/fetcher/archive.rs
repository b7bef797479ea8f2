//! Archive staging, extraction and executable permissions
//!
//! Archives are extracted into a hidden staging directory next to the final
//! cache directory and renamed into place once complete, so an existing cache
//! directory always holds a finished extraction.

use crate::error::{FetchError, FetchResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use zip::ZipArchive;

/// Executables that need the owner execute bit after extraction
pub const EXECUTABLES: [&str; 2] = ["LayoutTestHelper", "WebKitTestRunner"];

/// `<dir>.zip`
pub fn zip_path_for(dir: &Path) -> PathBuf {
    let mut path = OsString::from(dir.as_os_str());
    path.push(".zip");
    PathBuf::from(path)
}

/// Downloaded archive, removed when dropped
pub struct ArchiveFile {
    path: PathBuf,
}

impl ArchiveFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArchiveFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove archive {}: {}", self.path.display(), e);
            } else {
                debug!("Removed archive {}", self.path.display());
            }
        }
    }
}

/// Hidden sibling directory that becomes a cache directory on success.
///
/// Removed on drop unless promoted.
pub struct StagingDir {
    path: PathBuf,
    promoted: bool,
}

impl StagingDir {
    /// Create a uniquely named staging directory next to `dest`
    pub fn create(dest: &Path) -> FetchResult<Self> {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "extract".to_string());
        let path = dest.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

        fs::create_dir_all(&path)
            .map_err(|e| FetchError::io(format!("creating {}", path.display()), e))?;

        Ok(Self {
            path,
            promoted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename into `dest`.
    ///
    /// If `dest` appeared in the meantime another process finished the same
    /// fetch first; its copy is kept and ours is discarded.
    pub fn promote(mut self, dest: &Path) -> FetchResult<()> {
        match fs::rename(&self.path, dest) {
            Ok(()) => {
                self.promoted = true;
                Ok(())
            }
            Err(_) if dest.is_dir() => {
                debug!(
                    "{} already populated, discarding {}",
                    dest.display(),
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => Err(FetchError::io(
                format!("moving {} to {}", self.path.display(), dest.display()),
                e,
            )),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.promoted && self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("Failed to remove staging dir {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Extract every entry of the zip at `archive` into `dest`, preserving
/// relative paths. Returns the number of files written.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_zip(archive: &Path, dest: &Path) -> FetchResult<usize> {
    let file = File::open(archive)
        .map_err(|e| FetchError::io(format!("opening {}", archive.display()), e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| FetchError::corrupt_archive(archive, e))?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| FetchError::corrupt_archive(archive, e))?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| FetchError::io(format!("creating {}", out_path.display()), e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FetchError::io(format!("creating {}", parent.display()), e))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| FetchError::io(format!("creating {}", out_path.display()), e))?;
        copy_entry(archive, &mut entry, &out_path, &mut out)?;
        written += 1;
    }

    debug!("Extracted {} files into {}", written, dest.display());
    Ok(written)
}

// Read failures come from decompression and mean the archive is bad;
// write failures are local IO problems.
fn copy_entry(
    archive: &Path,
    entry: &mut impl Read,
    out_path: &Path,
    out: &mut impl Write,
) -> FetchResult<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = entry
            .read(&mut buf)
            .map_err(|e| FetchError::corrupt_archive(archive, e))?;
        if n == 0 {
            return Ok(());
        }
        out.write_all(&buf[..n])
            .map_err(|e| FetchError::io(format!("writing {}", out_path.display()), e))?;
    }
}

/// Give the known executables under `<dir>/<configuration_dir>/` owner
/// read/write/execute. Missing executables are skipped; returns the paths
/// that were changed.
pub fn set_executable_permissions(
    dir: &Path,
    configuration_dir: &str,
) -> FetchResult<Vec<PathBuf>> {
    let mut changed = Vec::new();

    for name in EXECUTABLES {
        let path = dir.join(configuration_dir).join(name);
        if !path.exists() {
            debug!("{} not present in archive", path.display());
            continue;
        }
        set_owner_rwx(&path)?;
        changed.push(path);
    }

    Ok(changed)
}

#[cfg(unix)]
fn set_owner_rwx(path: &Path) -> FetchResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
        .map_err(|e| FetchError::io(format!("setting permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
fn set_owner_rwx(_path: &Path) -> FetchResult<()> {
    Ok(())
}
