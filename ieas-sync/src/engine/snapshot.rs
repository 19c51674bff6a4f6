//! Per-cycle catalog snapshot
//!
//! Built from scratch at the start of every cycle and passed read-only
//! through the phases. Nothing survives into the next cycle.

use std::collections::HashMap;

use ieas_common::folders::parse_year_folder;
use ieas_common::uuid_utils::is_uuid;
use ieas_common::Result;

use crate::catalog::{LibraryCatalog, ServerCatalog};
use crate::models::{LibraryFolder, LibraryItem, RemoteAsset};

/// Library folder structure relevant to syncing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    /// Default folders: year -> folder id
    pub year_folders: HashMap<i32, String>,
    /// Named folders (children of a default folder): folder id -> name
    pub named_folders: HashMap<String, String>,
}

impl Taxonomy {
    /// Partition top-level folders into year folders and their named children
    ///
    /// Top-level folders that are not years, and anything nested deeper than
    /// one level below a year folder, are ignored. When a year has several
    /// default folders the first one is used for new items, but the children
    /// of all of them are named folders.
    pub fn from_folders(folders: &[LibraryFolder]) -> Self {
        let mut taxonomy = Taxonomy::default();

        for folder in folders {
            let Some(year) = parse_year_folder(&folder.name) else {
                continue;
            };

            match taxonomy.year_folders.get(&year) {
                Some(existing) => tracing::warn!(
                    year,
                    kept = %existing,
                    other = %folder.id,
                    "Duplicate default folder; new items go to the first one"
                ),
                None => {
                    taxonomy.year_folders.insert(year, folder.id.clone());
                }
            }

            // Named folders count under every default folder of the year
            for child in &folder.children {
                taxonomy
                    .named_folders
                    .insert(child.id.clone(), child.name.clone());
            }
        }

        taxonomy
    }

    pub fn is_named_folder(&self, folder_id: &str) -> bool {
        self.named_folders.contains_key(folder_id)
    }
}

/// Immutable view of both catalogs for one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    pub taxonomy: Taxonomy,
    /// Managed library items keyed by annotation (server asset id)
    pub library: HashMap<String, LibraryItem>,
    /// Items whose annotation repeats one already in `library`
    pub duplicates: Vec<LibraryItem>,
    /// Server assets keyed by id
    pub remote: HashMap<String, RemoteAsset>,
}

impl CycleSnapshot {
    /// Index already-fetched catalog listings
    ///
    /// Items without a UUID annotation were not imported by this service and
    /// are left out. When an annotation repeats, the first item wins.
    pub fn new(taxonomy: Taxonomy, items: Vec<LibraryItem>, assets: Vec<RemoteAsset>) -> Self {
        let mut library: HashMap<String, LibraryItem> = HashMap::with_capacity(items.len());
        let mut duplicates = Vec::new();

        for item in items {
            if !is_uuid(&item.annotation) {
                continue;
            }
            if library.contains_key(&item.annotation) {
                tracing::warn!(
                    item_id = %item.id,
                    annotation = %item.annotation,
                    "Library item repeats an annotation already in use"
                );
                duplicates.push(item);
                continue;
            }
            library.insert(item.annotation.clone(), item);
        }

        let remote = assets.into_iter().map(|a| (a.id.clone(), a)).collect();

        Self {
            taxonomy,
            library,
            duplicates,
            remote,
        }
    }

    /// Load folders, items and assets in order
    pub async fn load<L, S>(library: &L, server: &S, page_size: usize) -> Result<Self>
    where
        L: LibraryCatalog + ?Sized,
        S: ServerCatalog + ?Sized,
    {
        let folders = library.list_folders().await?;
        let taxonomy = Taxonomy::from_folders(&folders);

        let items = library.list_items().await?;
        let assets = server.fetch_all_assets(page_size).await?;

        tracing::debug!(
            year_folders = taxonomy.year_folders.len(),
            named_folders = taxonomy.named_folders.len(),
            library_items = items.len(),
            server_assets = assets.len(),
            "Loaded catalogs"
        );

        Ok(Self::new(taxonomy, items, assets))
    }
}
