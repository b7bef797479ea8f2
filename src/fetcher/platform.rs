//! Port identity and OS version resolution
//!
//! The OS version label is part of every cache key. It is derived once, when
//! a fetcher is constructed, from the port and the host's platform metadata.

use crate::config::schema::PlatformConfig;
use crate::error::{FetchError, FetchResult};
use semver::Version;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Ports with published build binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// macOS desktop
    Mac,
    /// iOS simulator
    IosSimulator,
}

impl Port {
    /// Port name as used in cache keys
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mac => "mac",
            Self::IosSimulator => "ios-simulator",
        }
    }
}

impl FromStr for Port {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mac" => Ok(Self::Mac),
            "ios-simulator" => Ok(Self::IosSimulator),
            other => Err(FetchError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Platform metadata needed to label builds
pub trait PlatformInfo {
    /// macOS marketing name, e.g. "Big Sur"
    fn os_version_name(&self) -> FetchResult<String>;

    /// Current iOS SDK version targeted by simulator builds
    fn ios_version(&self) -> FetchResult<Version>;
}

/// Resolve the OS version label for a port.
///
/// `mac` yields the lowercased marketing name with spaces removed
/// (`"Big Sur"` becomes `"bigsur"`); `ios-simulator` yields the iOS major
/// version.
pub fn resolve_os_version(port: Port, platform: &dyn PlatformInfo) -> FetchResult<String> {
    let label = match port {
        Port::Mac => platform.os_version_name()?.to_lowercase().replace(' ', ""),
        Port::IosSimulator => platform.ios_version()?.major.to_string(),
    };
    debug!("Resolved OS version for {}: {}", port, label);
    Ok(label)
}

/// Parse a possibly abbreviated version ("14", "14.2") into a full semver.
pub fn parse_ios_version(value: &str) -> FetchResult<Version> {
    let trimmed = value.trim();
    let mut parts: Vec<&str> = trimmed.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(FetchError::InvalidIosVersion {
            value: value.to_string(),
            reason: "expected MAJOR[.MINOR[.PATCH]]".to_string(),
        });
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    Version::parse(&parts.join(".")).map_err(|e| FetchError::InvalidIosVersion {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Map a macOS product version (`sw_vers -productVersion`) to its marketing name
pub fn macos_marketing_name(product_version: &str) -> Option<&'static str> {
    let mut parts = product_version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);

    match (major, minor) {
        (10, 13) => Some("High Sierra"),
        (10, 14) => Some("Mojave"),
        (10, 15) => Some("Catalina"),
        (11, _) => Some("Big Sur"),
        (12, _) => Some("Monterey"),
        (13, _) => Some("Ventura"),
        (14, _) => Some("Sonoma"),
        (15, _) => Some("Sequoia"),
        _ => None,
    }
}

/// Platform metadata of the machine we are running on
#[derive(Debug, Clone)]
pub struct SystemPlatform {
    os_version_name: Option<String>,
    ios_version: String,
}

impl SystemPlatform {
    /// Build from the `[platform]` config section
    pub fn from_config(config: &PlatformConfig) -> Self {
        Self {
            os_version_name: config.os_version_name.clone(),
            ios_version: config.ios_version.clone(),
        }
    }

    #[cfg(target_os = "macos")]
    fn detect_os_version_name() -> FetchResult<String> {
        let output = std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .map_err(|e| FetchError::io("running sw_vers", e))?;
        if !output.status.success() {
            return Err(FetchError::OsVersionUnknown(
                "sw_vers exited with an error".to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        macos_marketing_name(&version)
            .map(str::to_string)
            .ok_or_else(|| FetchError::OsVersionUnknown(format!("unknown macOS version {}", version)))
    }

    #[cfg(not(target_os = "macos"))]
    fn detect_os_version_name() -> FetchResult<String> {
        Err(FetchError::OsVersionUnknown(
            "not running on macOS and no os_version_name configured".to_string(),
        ))
    }
}

impl PlatformInfo for SystemPlatform {
    fn os_version_name(&self) -> FetchResult<String> {
        match &self.os_version_name {
            Some(name) => Ok(name.clone()),
            None => Self::detect_os_version_name(),
        }
    }

    fn ios_version(&self) -> FetchResult<Version> {
        parse_ios_version(&self.ios_version)
    }
}
