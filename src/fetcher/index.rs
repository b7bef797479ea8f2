//! Revision index decoding and revision selection
//!
//! The index endpoint returns items in the key-value store's native
//! serialization, with every attribute wrapped in a type tag:
//!
//! ```json
//! {"Count": 2, "Items": [{"revision": {"N": "101"}, "s3_url": {"S": "https://..."}}]}
//! ```
//!
//! The tagged shape is decoded here and never leaves this module.

use crate::error::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
struct WireIndex {
    #[serde(rename = "Count")]
    count: i64,
    #[serde(rename = "Items", default)]
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    revision: NumberAttr,
    s3_url: StringAttr,
}

#[derive(Debug, Deserialize)]
struct NumberAttr {
    #[serde(rename = "N")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct StringAttr {
    #[serde(rename = "S")]
    value: String,
}

/// One published build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub revision: String,
    pub s3_url: String,
}

/// Which revision the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionSelector {
    /// Newest build in the index
    Latest,
    /// A specific revision
    Explicit(String),
}

impl From<Option<String>> for RevisionSelector {
    fn from(revision: Option<String>) -> Self {
        match revision {
            Some(revision) => Self::Explicit(revision),
            None => Self::Latest,
        }
    }
}

/// Whether `revision` can name a cache directory: exactly one normal path
/// component, so joining it never leaves `<root>/<cache key>/`.
pub fn is_valid_revision(revision: &str) -> bool {
    let mut components = Path::new(revision).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Field of the newest index item used as the download URL for `Latest`.
///
/// Older tooling downloaded the revision identifier itself; `Revision` keeps
/// that behavior for compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatestDownloadSource {
    /// Use `revision.N` as the download URL
    #[default]
    #[serde(rename = "revision")]
    Revision,
    /// Use `s3_url.S` as the download URL
    #[serde(rename = "s3-url")]
    S3Url,
}

impl fmt::Display for LatestDownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revision => write!(f, "revision"),
            Self::S3Url => write!(f, "s3-url"),
        }
    }
}

impl FromStr for LatestDownloadSource {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revision" => Ok(Self::Revision),
            "s3-url" => Ok(Self::S3Url),
            other => Err(FetchError::User(format!(
                "Unknown latest download source '{}'. Valid values: revision, s3-url",
                other
            ))),
        }
    }
}

/// Revision chosen from the index and where to download it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub revision: String,
    pub download_url: String,
}

/// Decoded index response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionIndex {
    count: i64,
    entries: Vec<IndexEntry>,
}

impl RevisionIndex {
    /// Decode an index body fetched from `url`
    pub fn from_json(url: &str, body: &str) -> FetchResult<Self> {
        let wire: WireIndex = serde_json::from_str(body).map_err(|e| FetchError::IndexMalformed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let entries = wire
            .items
            .into_iter()
            .map(|item| IndexEntry {
                revision: item.revision.value,
                s3_url: item.s3_url.value,
            })
            .collect();

        Ok(Self {
            count: wire.count,
            entries,
        })
    }

    /// Item count reported by the index
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Entries in response order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Pick the revision to download.
    ///
    /// Explicit revisions match the first entry in response order. `url` is
    /// the index URL, used in error messages.
    pub fn select(
        &self,
        url: &str,
        selector: &RevisionSelector,
        latest_source: LatestDownloadSource,
    ) -> FetchResult<Selection> {
        if self.count < 1 {
            return Err(FetchError::NoRevisionsFound {
                url: url.to_string(),
            });
        }

        match selector {
            RevisionSelector::Latest => {
                let newest = self.entries.first().ok_or_else(|| FetchError::IndexMalformed {
                    url: url.to_string(),
                    reason: format!("Count is {} but Items is empty", self.count),
                })?;
                if !is_valid_revision(&newest.revision) {
                    return Err(FetchError::IndexMalformed {
                        url: url.to_string(),
                        reason: format!("revision '{}' is not a plain identifier", newest.revision),
                    });
                }

                // TODO: switch the default to S3Url once nothing depends on the revision-as-URL download
                let download_url = match latest_source {
                    LatestDownloadSource::Revision => newest.revision.clone(),
                    LatestDownloadSource::S3Url => newest.s3_url.clone(),
                };

                Ok(Selection {
                    revision: newest.revision.clone(),
                    download_url,
                })
            }
            RevisionSelector::Explicit(revision) if !is_valid_revision(revision) => {
                Err(FetchError::InvalidRevision(revision.clone()))
            }
            RevisionSelector::Explicit(revision) => self
                .entries
                .iter()
                .find(|entry| &entry.revision == revision)
                .map(|entry| Selection {
                    revision: entry.revision.clone(),
                    download_url: entry.s3_url.clone(),
                })
                .ok_or_else(|| FetchError::RevisionNotFound {
                    revision: revision.clone(),
                    url: url.to_string(),
                }),
        }
    }
}
