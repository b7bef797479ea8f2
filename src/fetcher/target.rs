//! Build targets and the cache keys derived from them

use super::platform::{resolve_os_version, PlatformInfo, Port};
use crate::error::FetchResult;
use std::fmt;

/// Key identifying a family of build artifacts.
///
/// Used both as the index path segment and the local directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Port, OS version, architecture and configuration of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    port: Port,
    os_version_name: String,
    architecture: String,
    configuration: String,
}

impl BuildTarget {
    /// Create a target, resolving the OS version label from the platform.
    ///
    /// Fails with `UnsupportedPlatform` for ports without published binaries.
    pub fn new(
        port_name: &str,
        architecture: &str,
        configuration: &str,
        platform: &dyn PlatformInfo,
    ) -> FetchResult<Self> {
        let port: Port = port_name.parse()?;
        let os_version_name = resolve_os_version(port, platform)?;

        Ok(Self {
            port,
            os_version_name,
            architecture: architecture.to_string(),
            configuration: configuration.to_string(),
        })
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn os_version_name(&self) -> &str {
        &self.os_version_name
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// `port-osversion-architecture-configuration`, lowercased
    pub fn cache_key(&self) -> CacheKey {
        CacheKey(
            format!(
                "{}-{}-{}-{}",
                self.port, self.os_version_name, self.architecture, self.configuration
            )
            .to_lowercase(),
        )
    }

    /// Directory holding the executables inside an archive, e.g. `Release`
    pub fn configuration_dir(&self) -> String {
        let mut chars = self.configuration.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect(),
            None => String::new(),
        }
    }
}
