//! binfetch - prebuilt layout test binaries
//!
//! Resolves a port/architecture/configuration to a cached directory of
//! extracted test runner binaries, downloading the requested revision from
//! the revision index when it is not cached yet.
//!
//! ```rust,ignore
//! use binfetch::config::Config;
//! use binfetch::fetcher::{BinaryFetcher, Host};
//!
//! let config = Config::default();
//! let host = Host::from_config(&config, "/src/WebKit/WebKitBuild/downloaded_binaries");
//! let fetcher = BinaryFetcher::new(host, "mac", "x86_64", "release", Some("271234".into()))?;
//! let dir = fetcher.get_path()?;
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod ui;

pub use error::{FetchError, FetchResult};
pub use fetcher::{BinaryFetcher, FetchEvent, FetchSettings, Host};
