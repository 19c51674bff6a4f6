//! In-memory Library and Server catalogs recording every mutating call

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ieas_common::{Error, Result};
use ieas_sync::models::{
    AlbumAsset, AssetType, ImportRequest, LibraryFolder, LibraryItem, RemoteAlbum, RemoteAsset,
};
use ieas_sync::{LibraryCatalog, ServerCatalog};

fn upstream_failure(what: &str) -> Error {
    Error::Upstream {
        status: 500,
        body: format!("{} failed", what),
    }
}

#[derive(Debug, Default)]
pub struct LibraryState {
    pub folders: Vec<LibraryFolder>,
    pub items: Vec<LibraryItem>,
    pub next_id: usize,
    /// Mutating calls in arrival order
    pub mutations: Vec<String>,
    pub imports: Vec<ImportRequest>,
    pub trash_calls: Vec<Vec<String>>,
    pub folder_creates: usize,
    pub fail_folder_create: bool,
    pub fail_list_items: bool,
    /// Annotations whose import fails
    pub fail_imports: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeLibrary {
    state: Arc<Mutex<LibraryState>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap()
    }

    fn next_id(state: &mut LibraryState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}{:06}", prefix, state.next_id)
    }

    /// Add a top-level folder, returns its id
    pub fn add_folder(&self, name: &str) -> String {
        let mut state = self.state();
        let id = Self::next_id(&mut state, "F");
        state.folders.push(LibraryFolder {
            id: id.clone(),
            name: name.to_string(),
            children: Vec::new(),
        });
        id
    }

    /// Add a folder below `parent_id`, returns its id
    pub fn add_child_folder(&self, parent_id: &str, name: &str) -> String {
        let mut state = self.state();
        let id = Self::next_id(&mut state, "F");
        let parent = state
            .folders
            .iter_mut()
            .find(|f| f.id == parent_id)
            .expect("parent folder exists");
        parent.children.push(LibraryFolder {
            id: id.clone(),
            name: name.to_string(),
            children: Vec::new(),
        });
        id
    }

    pub fn rename_folder(&self, folder_id: &str, name: &str) {
        let mut state = self.state();
        for folder in state.folders.iter_mut() {
            if folder.id == folder_id {
                folder.name = name.to_string();
            }
            for child in folder.children.iter_mut() {
                if child.id == folder_id {
                    child.name = name.to_string();
                }
            }
        }
    }

    pub fn remove_folder(&self, folder_id: &str) {
        let mut state = self.state();
        state.folders.retain(|f| f.id != folder_id);
        for folder in state.folders.iter_mut() {
            folder.children.retain(|c| c.id != folder_id);
        }
    }

    /// Add an item annotated with `annotation`, returns its id
    pub fn add_item(&self, annotation: &str, folders: &[&str]) -> String {
        let mut state = self.state();
        let id = Self::next_id(&mut state, "I");
        state.items.push(LibraryItem {
            id: id.clone(),
            name: format!("item {}", id),
            annotation: annotation.to_string(),
            folders: folders.iter().map(|f| f.to_string()).collect(),
        });
        id
    }

    pub fn set_item_folders(&self, item_id: &str, folders: &[&str]) {
        let mut state = self.state();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .expect("item exists");
        item.folders = folders.iter().map(|f| f.to_string()).collect();
    }

    pub fn annotations(&self) -> BTreeSet<String> {
        self.state()
            .items
            .iter()
            .map(|i| i.annotation.clone())
            .collect()
    }

    pub fn item_by_annotation(&self, annotation: &str) -> Option<LibraryItem> {
        self.state()
            .items
            .iter()
            .find(|i| i.annotation == annotation)
            .cloned()
    }

    pub fn mutation_count(&self) -> usize {
        self.state().mutations.len()
    }
}

#[async_trait]
impl LibraryCatalog for FakeLibrary {
    async fn list_folders(&self) -> Result<Vec<LibraryFolder>> {
        Ok(self.state().folders.clone())
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<LibraryFolder> {
        // Give concurrent callers a chance to interleave
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.folder_creates += 1;
        state.mutations.push(format!("create_folder:{}", name));
        if state.fail_folder_create {
            return Err(upstream_failure("create_folder"));
        }

        let id = Self::next_id(&mut state, "F");
        let folder = LibraryFolder {
            id,
            name: name.to_string(),
            children: Vec::new(),
        };
        match parent {
            Some(parent_id) => {
                if let Some(p) = state.folders.iter_mut().find(|f| f.id == parent_id) {
                    p.children.push(folder.clone());
                }
            }
            None => state.folders.push(folder.clone()),
        }
        Ok(folder)
    }

    async fn list_items(&self) -> Result<Vec<LibraryItem>> {
        let state = self.state();
        if state.fail_list_items {
            return Err(upstream_failure("list_items"));
        }
        Ok(state.items.clone())
    }

    async fn add_from_url(&self, request: &ImportRequest) -> Result<()> {
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.mutations.push(format!("add:{}", request.annotation));
        if state.fail_imports.contains(&request.annotation) {
            return Err(upstream_failure("add_from_url"));
        }

        state.imports.push(request.clone());
        let id = Self::next_id(&mut state, "I");
        state.items.push(LibraryItem {
            id,
            name: request.name.clone(),
            annotation: request.annotation.clone(),
            folders: request.folder_id.iter().cloned().collect(),
        });
        Ok(())
    }

    async fn move_to_trash(&self, item_ids: &[String]) -> Result<()> {
        let mut state = self.state();
        state.mutations.push(format!("trash:{}", item_ids.join(",")));
        state.trash_calls.push(item_ids.to_vec());
        state.items.retain(|i| !item_ids.contains(&i.id));
        Ok(())
    }

    async fn library_path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/library/Test.library"))
    }
}

#[derive(Debug, Default)]
pub struct ServerState {
    pub assets: Vec<RemoteAsset>,
    pub albums: Vec<RemoteAlbum>,
    pub next_id: usize,
    pub mutations: Vec<String>,
    pub fail_create_album: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn add_asset(&self, id: &str, asset_type: AssetType, file_name: &str, local: &str, created: &str) {
        self.state().assets.push(RemoteAsset {
            id: id.to_string(),
            asset_type,
            original_file_name: file_name.to_string(),
            local_date_time: local.to_string(),
            file_created_at: created.to_string(),
        });
    }

    /// Image asset taken at local noon on `year`-06-15
    pub fn add_image(&self, id: &str, year: i32) {
        self.add_asset(
            id,
            AssetType::Image,
            &format!("IMG_{}.JPG", &id[id.len() - 4..]),
            &format!("{}-06-15T12:00:00.000Z", year),
            &format!("{}-06-15T10:00:00.000Z", year),
        );
    }

    pub fn remove_asset(&self, id: &str) {
        self.state().assets.retain(|a| a.id != id);
    }

    /// Add an album directly, returns its id
    pub fn add_album(&self, name: &str, description: &str, asset_ids: &[&str]) -> String {
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("A{:04}", state.next_id);
        state.albums.push(RemoteAlbum {
            id: id.clone(),
            album_name: name.to_string(),
            description: description.to_string(),
            assets: asset_ids
                .iter()
                .map(|a| AlbumAsset { id: a.to_string() })
                .collect(),
        });
        id
    }

    pub fn album(&self, album_id: &str) -> Option<RemoteAlbum> {
        self.state().albums.iter().find(|a| a.id == album_id).cloned()
    }

    pub fn albums(&self) -> Vec<RemoteAlbum> {
        self.state().albums.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state().mutations.len()
    }
}

#[async_trait]
impl ServerCatalog for FakeServer {
    async fn fetch_all_assets(&self, _page_size: usize) -> Result<Vec<RemoteAsset>> {
        Ok(self.state().assets.clone())
    }

    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>> {
        // The list endpoint omits members
        Ok(self
            .state()
            .albums
            .iter()
            .map(|a| RemoteAlbum {
                assets: Vec::new(),
                ..a.clone()
            })
            .collect())
    }

    async fn get_album(&self, album_id: &str) -> Result<RemoteAlbum> {
        self.album(album_id)
            .ok_or_else(|| Error::NotFound(format!("album {}", album_id)))
    }

    async fn create_album(
        &self,
        name: &str,
        description: &str,
        asset_ids: &[String],
    ) -> Result<RemoteAlbum> {
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.mutations.push(format!("create_album:{}", description));
        if state.fail_create_album {
            return Err(upstream_failure("create_album"));
        }

        state.next_id += 1;
        let album = RemoteAlbum {
            id: format!("A{:04}", state.next_id),
            album_name: name.to_string(),
            description: description.to_string(),
            assets: asset_ids
                .iter()
                .map(|a| AlbumAsset { id: a.clone() })
                .collect(),
        };
        state.albums.push(album.clone());
        Ok(album)
    }

    async fn delete_album(&self, album_id: &str) -> Result<()> {
        let mut state = self.state();
        state.mutations.push(format!("delete_album:{}", album_id));
        state.albums.retain(|a| a.id != album_id);
        Ok(())
    }

    async fn rename_album(&self, album_id: &str, name: &str) -> Result<()> {
        let mut state = self.state();
        state.mutations.push(format!("rename_album:{}", album_id));
        if let Some(album) = state.albums.iter_mut().find(|a| a.id == album_id) {
            album.album_name = name.to_string();
        }
        Ok(())
    }

    async fn add_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()> {
        let mut state = self.state();
        state
            .mutations
            .push(format!("add_album_assets:{}:{}", album_id, asset_ids.join(",")));
        if let Some(album) = state.albums.iter_mut().find(|a| a.id == album_id) {
            for id in asset_ids {
                album.assets.push(AlbumAsset { id: id.clone() });
            }
        }
        Ok(())
    }

    async fn remove_album_assets(&self, album_id: &str, asset_ids: &[String]) -> Result<()> {
        let mut state = self.state();
        state
            .mutations
            .push(format!("remove_album_assets:{}:{}", album_id, asset_ids.join(",")));
        if let Some(album) = state.albums.iter_mut().find(|a| a.id == album_id) {
            album.assets.retain(|a| !asset_ids.contains(&a.id));
        }
        Ok(())
    }
}
