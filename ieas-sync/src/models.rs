//! Catalog data model
//!
//! Wire shapes for Eagle (Library) and Immich (Server) entities, trimmed to
//! the fields reconciliation needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Eagle folder, with nested children as returned by `/folder/list`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LibraryFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<LibraryFolder>,
}

/// Eagle item
///
/// `annotation` carries the Immich asset id the item was imported from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LibraryItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub annotation: String,
    #[serde(default)]
    pub folders: BTreeSet<String>,
}

/// Payload for Eagle `/item/addFromURL`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub url: String,
    pub name: String,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

/// Immich asset kind
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Image,
    Video,
    /// AUDIO, OTHER and anything newer; never synced
    #[serde(other)]
    Other,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Image => "IMAGE",
            AssetType::Video => "VIDEO",
            AssetType::Other => "OTHER",
        }
    }

    pub fn is_syncable(&self) -> bool {
        matches!(self, AssetType::Image | AssetType::Video)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immich asset, as listed by `/search/metadata`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub original_file_name: String,
    pub local_date_time: String,
    pub file_created_at: String,
}

/// Immich album
///
/// `description` carries the id of the Eagle named folder it mirrors.
/// `assets` is only populated by the single-album endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAlbum {
    pub id: String,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assets: Vec<AlbumAsset>,
}

impl RemoteAlbum {
    pub fn asset_ids(&self) -> BTreeSet<String> {
        self.assets.iter().map(|a| a.id.clone()).collect()
    }
}

/// Asset reference inside an album response
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AlbumAsset {
    pub id: String,
}
