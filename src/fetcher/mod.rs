//! Build binary fetching
//!
//! Resolves a port/architecture/configuration triple to a local directory of
//! extracted test runner binaries, downloading them from the revision index
//! when no complete copy is cached.
//!
//! # Flow
//!
//! | Step | Action |
//! |------|--------|
//! | 1 | Explicit revision already cached → return it, no network |
//! | 2 | GET `<api_base>/<cache key>` and select a revision |
//! | 3 | Resolved revision already cached → return it |
//! | 4 | Download archive to `<cache dir>.zip` |
//! | 5 | Extract into a staging dir, fix permissions, rename into place |

pub mod archive;
pub mod events;
pub mod index;
pub mod platform;
pub mod target;
pub mod transport;

pub use events::FetchEvent;
pub use index::{
    is_valid_revision, IndexEntry, LatestDownloadSource, RevisionIndex, RevisionSelector,
    Selection,
};
pub use platform::{resolve_os_version, PlatformInfo, Port, SystemPlatform};
pub use target::{BuildTarget, CacheKey};
pub use transport::{Download, Transport, UreqTransport};

use crate::config::schema::IndexConfig;
use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use archive::{extract_zip, set_executable_permissions, zip_path_for, ArchiveFile, StagingDir};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Versioned revision index endpoint
pub const DEFAULT_API_BASE: &str =
    "https://q1tzqfy48e.execute-api.us-west-2.amazonaws.com/v2/latest";

/// Index endpoint and revision selection behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub api_base: String,
    pub latest_download_source: LatestDownloadSource,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            latest_download_source: LatestDownloadSource::default(),
        }
    }
}

impl From<&IndexConfig> for FetchSettings {
    fn from(config: &IndexConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            latest_download_source: config.latest_download_source,
        }
    }
}

/// Filesystem root, platform metadata and network access used by a fetcher
pub struct Host {
    downloaded_binaries_dir: PathBuf,
    platform: Box<dyn PlatformInfo>,
    transport: Box<dyn Transport>,
}

impl Host {
    pub fn new(
        downloaded_binaries_dir: impl Into<PathBuf>,
        platform: impl PlatformInfo + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            downloaded_binaries_dir: downloaded_binaries_dir.into(),
            platform: Box::new(platform),
            transport: Box::new(transport),
        }
    }

    /// Real platform detection and HTTP, configured from `config`
    pub fn from_config(config: &Config, downloaded_binaries_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            downloaded_binaries_dir,
            SystemPlatform::from_config(&config.platform),
            UreqTransport::from_config(&config.http),
        )
    }

    /// Root holding one directory per cache key
    pub fn downloaded_binaries_dir(&self) -> &Path {
        &self.downloaded_binaries_dir
    }
}

type Observer = Box<dyn Fn(&FetchEvent)>;

/// Fetches and caches the binaries for one build target
pub struct BinaryFetcher {
    host: Host,
    target: BuildTarget,
    selector: RevisionSelector,
    settings: FetchSettings,
    observer: Option<Observer>,
}

impl BinaryFetcher {
    /// Create a fetcher.
    ///
    /// The OS version label is resolved and an explicit revision checked
    /// here, so unsupported ports and unusable revisions fail before any
    /// network access.
    pub fn new(
        host: Host,
        port_name: &str,
        architecture: &str,
        configuration: &str,
        revision: Option<String>,
    ) -> FetchResult<Self> {
        let target = BuildTarget::new(port_name, architecture, configuration, &*host.platform)?;
        debug!("Fetcher target: {}", target.cache_key());

        let selector = RevisionSelector::from(revision);
        if let RevisionSelector::Explicit(revision) = &selector {
            if !is_valid_revision(revision) {
                return Err(FetchError::InvalidRevision(revision.clone()));
            }
        }

        Ok(Self {
            host,
            target,
            selector,
            settings: FetchSettings::default(),
            observer: None,
        })
    }

    /// Override the index endpoint and latest-revision behavior
    pub fn with_settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Receive progress events during `get_path`
    pub fn with_observer(mut self, observer: impl Fn(&FetchEvent) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    pub fn selector(&self) -> &RevisionSelector {
        &self.selector
    }

    pub fn cache_key(&self) -> CacheKey {
        self.target.cache_key()
    }

    /// `<api_base>/<cache key>`
    pub fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.settings.api_base.trim_end_matches('/'),
            self.cache_key()
        )
    }

    /// `<downloaded binaries>/<cache key>/<revision>`
    pub fn local_dir(&self, revision: &str) -> PathBuf {
        self.host
            .downloaded_binaries_dir
            .join(self.cache_key().as_str())
            .join(revision)
    }

    /// Return the local directory holding the extracted binaries, fetching
    /// them first if needed.
    pub fn get_path(&self) -> FetchResult<PathBuf> {
        if let RevisionSelector::Explicit(revision) = &self.selector {
            let local = self.local_dir(revision);
            if local.is_dir() {
                return Ok(self.cache_hit(local));
            }
        }

        let index_url = self.index_url();
        self.emit(FetchEvent::QueryingIndex {
            url: index_url.clone(),
        });
        let index = self.fetch_index(&index_url)?;

        let selection =
            index.select(&index_url, &self.selector, self.settings.latest_download_source)?;
        info!(
            "Selected revision {} ({})",
            selection.revision, selection.download_url
        );
        self.emit(FetchEvent::RevisionSelected {
            revision: selection.revision.clone(),
            download_url: selection.download_url.clone(),
        });

        let local = self.local_dir(&selection.revision);
        if local.is_dir() {
            return Ok(self.cache_hit(local));
        }

        self.fetch_archive(&selection.download_url, &local)?;
        Ok(local)
    }

    fn cache_hit(&self, local: PathBuf) -> PathBuf {
        info!(
            "Build binaries already downloaded and can be found at: {}",
            local.display()
        );
        self.emit(FetchEvent::CacheHit {
            path: local.clone(),
        });
        local
    }

    fn fetch_index(&self, url: &str) -> FetchResult<RevisionIndex> {
        let mut download = self.host.transport.get(url)?;
        let mut body = String::new();
        download
            .body
            .read_to_string(&mut body)
            .map_err(|e| FetchError::download(url, e))?;

        RevisionIndex::from_json(url, &body)
    }

    fn fetch_archive(&self, url: &str, local: &Path) -> FetchResult<()> {
        info!("Starting archive download: {}", url);
        let download = self.host.transport.get(url)?;
        self.emit(FetchEvent::DownloadStarted {
            url: url.to_string(),
            total_bytes: download.content_length,
        });

        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FetchError::io(format!("creating {}", parent.display()), e))?;
        }

        let archive = ArchiveFile::new(zip_path_for(local));
        debug!("Writing archive to {}", archive.path().display());
        self.write_archive(url, download, archive.path())?;

        self.emit(FetchEvent::Extracting {
            archive: archive.path().to_path_buf(),
        });
        let staging = StagingDir::create(local)?;
        extract_zip(archive.path(), staging.path())?;
        drop(archive);

        let changed = set_executable_permissions(staging.path(), &self.target.configuration_dir())?;
        debug!("Marked {} executables", changed.len());

        staging.promote(local)?;
        info!("Extracted build binaries can be found at: {}", local.display());
        self.emit(FetchEvent::Ready {
            path: local.to_path_buf(),
        });
        Ok(())
    }

    fn write_archive(&self, url: &str, mut download: Download, path: &Path) -> FetchResult<()> {
        let mut file = File::create(path)
            .map_err(|e| FetchError::io(format!("creating {}", path.display()), e))?;

        let mut buf = vec![0u8; 64 * 1024];
        let mut written: u64 = 0;
        loop {
            let n = download
                .body
                .read(&mut buf)
                .map_err(|e| FetchError::download(url, e))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .map_err(|e| FetchError::io(format!("writing {}", path.display()), e))?;
            written += n as u64;
            self.emit(FetchEvent::DownloadProgress { bytes: written });
        }

        file.flush()
            .map_err(|e| FetchError::io(format!("writing {}", path.display()), e))?;
        debug!("Downloaded {} bytes", written);
        Ok(())
    }

    fn emit(&self, event: FetchEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::archive::tests::build_zip;
    use super::*;
    use semver::Version;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::rc::Rc;
    use tempfile::TempDir;

    const API: &str = "https://index.test/v2/latest";
    const INDEX_URL: &str = "https://index.test/v2/latest/mac-bigsur-x86_64-release";

    struct FixedPlatform;

    impl PlatformInfo for FixedPlatform {
        fn os_version_name(&self) -> FetchResult<String> {
            Ok("Big Sur".to_string())
        }

        fn ios_version(&self) -> FetchResult<Version> {
            Ok(Version::new(14, 0, 0))
        }
    }

    /// Serves canned bodies and records every requested URL
    #[derive(Clone, Default)]
    struct MockTransport {
        responses: Rc<RefCell<HashMap<String, Vec<u8>>>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl MockTransport {
        fn respond(&self, url: &str, body: impl Into<Vec<u8>>) {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), body.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str) -> FetchResult<Download> {
            self.calls.borrow_mut().push(url.to_string());
            match self.responses.borrow().get(url) {
                Some(body) => Ok(Download {
                    content_length: Some(body.len() as u64),
                    body: Box::new(Cursor::new(body.clone())),
                }),
                None => Err(FetchError::download(url, "404 Not Found")),
            }
        }
    }

    fn two_item_index() -> &'static str {
        r#"{"Count": 2, "Items": [
            {"revision": {"N": "100"}, "s3_url": {"S": "https://s3.test/100.zip"}},
            {"revision": {"N": "101"}, "s3_url": {"S": "https://s3.test/101.zip"}}
        ]}"#
    }

    fn runner_zip() -> Vec<u8> {
        build_zip(&[
            ("Release/", b""),
            ("Release/LayoutTestHelper", b"helper"),
            ("Release/WebKitTestRunner", b"runner"),
            ("Release/libTestRunnerInjectedBundle.dylib", b"bundle"),
        ])
    }

    fn fetcher(
        temp: &TempDir,
        transport: &MockTransport,
        revision: Option<&str>,
    ) -> BinaryFetcher {
        let host = Host::new(temp.path(), FixedPlatform, transport.clone());
        BinaryFetcher::new(
            host,
            "mac",
            "x86_64",
            "release",
            revision.map(str::to_string),
        )
        .unwrap()
        .with_settings(FetchSettings {
            api_base: API.to_string(),
            latest_download_source: LatestDownloadSource::Revision,
        })
    }

    #[test]
    fn index_url_joins_cache_key() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        let fetcher = fetcher(&temp, &transport, None).with_settings(FetchSettings {
            api_base: format!("{}/", API),
            latest_download_source: LatestDownloadSource::Revision,
        });
        assert_eq!(fetcher.index_url(), INDEX_URL);
    }

    #[test]
    fn unsupported_port_fails_before_network() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        let host = Host::new(temp.path(), FixedPlatform, transport.clone());

        let err = match BinaryFetcher::new(host, "win", "x86_64", "release", None) {
            Ok(_) => panic!("expected UnsupportedPlatform"),
            Err(e) => e,
        };

        assert!(matches!(err, FetchError::UnsupportedPlatform(ref p) if p == "win"));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn new_records_target_and_selector() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        let fetcher = fetcher(&temp, &transport, Some("271234"));

        assert_eq!(fetcher.target().port(), Port::Mac);
        assert_eq!(
            fetcher.selector(),
            &RevisionSelector::Explicit("271234".to_string())
        );
        assert_eq!(fetcher.host.downloaded_binaries_dir(), temp.path());
        assert_eq!(
            fetcher.local_dir("271234"),
            fetcher
                .host
                .downloaded_binaries_dir()
                .join("mac-bigsur-x86_64-release/271234")
        );
    }

    #[test]
    fn path_like_explicit_revision_is_rejected() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        let elsewhere = temp.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();

        for revision in [elsewhere.to_string_lossy().into_owned(), "../100".to_string()] {
            let host = Host::new(temp.path().join("cache"), FixedPlatform, transport.clone());
            let result =
                BinaryFetcher::new(host, "mac", "x86_64", "release", Some(revision.clone()));
            let err = match result {
                Ok(_) => panic!("expected InvalidRevision for {}", revision),
                Err(e) => e,
            };
            assert!(matches!(err, FetchError::InvalidRevision(ref r) if *r == revision));
        }
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn latest_revision_from_index_stays_inside_cache() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        let transport = MockTransport::default();
        transport.respond(
            INDEX_URL,
            r#"{"Count": 1, "Items": [{"revision": {"N": "../../pwned"}, "s3_url": {"S": "https://s3.test/pwned.zip"}}]}"#,
        );
        transport.respond("https://s3.test/pwned.zip", runner_zip());

        let host = Host::new(&root, FixedPlatform, transport.clone());
        let err = BinaryFetcher::new(host, "mac", "x86_64", "release", None)
            .unwrap()
            .with_settings(FetchSettings {
                api_base: API.to_string(),
                latest_download_source: LatestDownloadSource::S3Url,
            })
            .get_path()
            .unwrap_err();

        assert!(matches!(err, FetchError::IndexMalformed { .. }));
        assert_eq!(transport.calls(), vec![INDEX_URL.to_string()]);
        assert!(!temp.path().join("pwned").exists());
        assert!(!root.exists());
    }

    #[test]
    fn cached_explicit_revision_skips_network() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        let fetcher = fetcher(&temp, &transport, Some("100"));
        let cached = temp.path().join("mac-bigsur-x86_64-release").join("100");
        fs::create_dir_all(&cached).unwrap();

        assert_eq!(fetcher.get_path().unwrap(), cached);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn empty_index_reports_url() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, r#"{"Count": 0, "Items": []}"#);

        let err = fetcher(&temp, &transport, None).get_path().unwrap_err();

        assert!(matches!(err, FetchError::NoRevisionsFound { ref url } if url == INDEX_URL));
    }

    #[test]
    fn explicit_revision_downloads_matching_url() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        transport.respond("https://s3.test/101.zip", runner_zip());

        let path = fetcher(&temp, &transport, Some("101")).get_path().unwrap();

        assert_eq!(
            transport.calls(),
            vec![INDEX_URL.to_string(), "https://s3.test/101.zip".to_string()]
        );
        assert_eq!(path, temp.path().join("mac-bigsur-x86_64-release").join("101"));
    }

    #[test]
    fn unknown_revision_is_reported() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());

        let err = fetcher(&temp, &transport, Some("999")).get_path().unwrap_err();

        assert!(matches!(err, FetchError::RevisionNotFound { ref revision, .. } if revision == "999"));
        assert_eq!(transport.calls(), vec![INDEX_URL.to_string()]);
    }

    #[test]
    fn latest_downloads_revision_literal() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(
            INDEX_URL,
            r#"{"Count": 1, "Items": [{"revision": {"N": "102"}, "s3_url": {"S": "https://s3.test/102.zip"}}]}"#,
        );

        let err = fetcher(&temp, &transport, None).get_path().unwrap_err();

        assert_eq!(transport.calls(), vec![INDEX_URL.to_string(), "102".to_string()]);
        assert!(matches!(err, FetchError::Download { ref url, .. } if url == "102"));
    }

    #[test]
    fn latest_with_s3_url_source() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(
            INDEX_URL,
            r#"{"Count": 1, "Items": [{"revision": {"N": "102"}, "s3_url": {"S": "https://s3.test/102.zip"}}]}"#,
        );
        transport.respond("https://s3.test/102.zip", runner_zip());

        let path = fetcher(&temp, &transport, None)
            .with_settings(FetchSettings {
                api_base: API.to_string(),
                latest_download_source: LatestDownloadSource::S3Url,
            })
            .get_path()
            .unwrap();

        assert_eq!(path, temp.path().join("mac-bigsur-x86_64-release").join("102"));
        assert!(path.join("Release/WebKitTestRunner").is_file());
    }

    #[test]
    fn latest_already_cached_skips_download() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        let cached = temp.path().join("mac-bigsur-x86_64-release").join("100");
        fs::create_dir_all(&cached).unwrap();

        assert_eq!(fetcher(&temp, &transport, None).get_path().unwrap(), cached);
        assert_eq!(transport.calls(), vec![INDEX_URL.to_string()]);
    }

    #[test]
    fn extraction_removes_archive_and_marks_executables() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        transport.respond("https://s3.test/100.zip", runner_zip());

        let path = fetcher(&temp, &transport, Some("100")).get_path().unwrap();

        assert!(!archive::zip_path_for(&path).exists());
        assert_eq!(fs::read(path.join("Release/LayoutTestHelper")).unwrap(), b"helper");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = |name: &str| {
                fs::metadata(path.join("Release").join(name))
                    .unwrap()
                    .permissions()
                    .mode()
            };
            assert_eq!(mode("LayoutTestHelper") & 0o700, 0o700);
            assert_eq!(mode("WebKitTestRunner") & 0o700, 0o700);
            assert_eq!(mode("libTestRunnerInjectedBundle.dylib") & 0o100, 0);
        }

        // Only the cache dir remains next to it: no zip, no staging dir
        let siblings = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(siblings, 1);
    }

    #[test]
    fn missing_executables_are_not_an_error() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        transport.respond(
            "https://s3.test/100.zip",
            build_zip(&[("Release/WebKitTestRunner", b"runner")]),
        );

        let path = fetcher(&temp, &transport, Some("100")).get_path().unwrap();
        assert!(!path.join("Release/LayoutTestHelper").exists());
    }

    #[test]
    fn corrupt_archive_leaves_no_cache_entry() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        transport.respond("https://s3.test/100.zip", "<Error>AccessDenied</Error>");

        let fetcher = fetcher(&temp, &transport, Some("100"));
        let err = fetcher.get_path().unwrap_err();
        assert!(matches!(err, FetchError::CorruptArchive { .. }));

        let key_dir = temp.path().join("mac-bigsur-x86_64-release");
        assert!(!key_dir.join("100").exists());
        assert_eq!(fs::read_dir(&key_dir).unwrap().count(), 0);

        // A second call retries the whole fetch instead of trusting a partial dir
        transport.respond("https://s3.test/100.zip", runner_zip());
        let path = fetcher.get_path().unwrap();
        assert_eq!(path, key_dir.join("100"));
        assert_eq!(transport.calls().len(), 4);
    }

    #[test]
    fn observer_sees_progress() {
        let temp = TempDir::new().unwrap();
        let transport = MockTransport::default();
        transport.respond(INDEX_URL, two_item_index());
        transport.respond("https://s3.test/100.zip", runner_zip());

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let path = fetcher(&temp, &transport, Some("100"))
            .with_observer(move |event| sink.borrow_mut().push(event.clone()))
            .get_path()
            .unwrap();

        let events = events.borrow();
        assert_eq!(
            events.first(),
            Some(&FetchEvent::QueryingIndex {
                url: INDEX_URL.to_string()
            })
        );
        assert!(events
            .iter()
            .any(|e| matches!(e, FetchEvent::DownloadProgress { bytes } if *bytes > 0)));
        assert_eq!(events.last(), Some(&FetchEvent::Ready { path }));
    }
}
