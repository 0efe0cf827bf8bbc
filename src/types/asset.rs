//! Asset and archive references.
//!
//! Assets are single blobs; archives are collections of assets or nested
//! archives. Both are references only: nothing here reads files or fetches
//! URLs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A reference to a single blob of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Inline text content.
    Text(String),
    /// A file on the local filesystem.
    Path(PathBuf),
    /// A remote location, by URI.
    Uri(String),
}

impl Default for Asset {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A reference to a collection of blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archive {
    /// Named members, each an asset or a nested archive.
    Assets(BTreeMap<String, AssetOrArchive>),
    /// An archive file on the local filesystem.
    Path(PathBuf),
    /// A remote archive, by URI.
    Uri(String),
}

impl Default for Archive {
    fn default() -> Self {
        Self::Assets(BTreeMap::new())
    }
}

/// Either an [`Asset`] or an [`Archive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOrArchive {
    /// A single asset.
    Asset(Asset),
    /// A nested archive.
    Archive(Archive),
}

impl Default for AssetOrArchive {
    fn default() -> Self {
        Self::Asset(Asset::default())
    }
}

impl From<Asset> for AssetOrArchive {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

impl From<Archive> for AssetOrArchive {
    fn from(archive: Archive) -> Self {
        Self::Archive(archive)
    }
}

impl Archive {
    /// Returns the number of direct members of an inline archive.
    ///
    /// Path and URI archives report `None`: their contents are not known
    /// without I/O.
    #[must_use]
    pub fn member_count(&self) -> Option<usize> {
        match self {
            Self::Assets(members) => Some(members.len()),
            Self::Path(_) | Self::Uri(_) => None,
        }
    }
}
