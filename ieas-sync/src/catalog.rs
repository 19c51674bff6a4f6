//! Catalog seams used by the reconciliation engine
//!
//! The HTTP clients implement these traits; tests substitute in-memory
//! catalogs.

use std::path::PathBuf;

use async_trait::async_trait;
use ieas_common::Result;

use crate::models::{ImportRequest, LibraryFolder, LibraryItem, RemoteAlbum, RemoteAsset};

/// Local media library (Eagle)
#[async_trait]
pub trait LibraryCatalog: Send + Sync {
    /// Top-level folders with their nested children
    async fn list_folders(&self) -> Result<Vec<LibraryFolder>>;

    /// Create a folder, top-level when `parent` is `None`
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder>;

    /// Every item in the library
    async fn list_items(&self) -> Result<Vec<LibraryItem>>;

    /// Import an item by URL
    async fn add_from_url(&self, request: &ImportRequest) -> Result<()>;

    /// Move items to the trash in one call
    async fn move_to_trash(&self, item_ids: &[String]) -> Result<()>;

    /// Storage root of the open library
    async fn library_path(&self) -> Result<PathBuf>;
}

/// Remote photo server (Immich)
#[async_trait]
pub trait ServerCatalog: Send + Sync {
    /// Every visible image and video asset
    async fn fetch_all_assets(&self, page_size: usize) -> Result<Vec<RemoteAsset>>;

    /// Albums without their asset lists
    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>>;

    /// One album including its assets
    async fn get_album(&self, album_id: &str) -> Result<RemoteAlbum>;

    async fn create_album(
        &self,
        name: &str,
        description: &str,
        asset_ids: &[String],
    ) -> Result<RemoteAlbum>;

    async fn delete_album(&self, album_id: &str) -> Result<()>;

    async fn rename_album(&self, album_id: &str, name: &str) -> Result<()>;

    async fn add_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()>;

    async fn remove_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()>;
}
