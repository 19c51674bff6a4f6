//! Default (year) folder registry
//!
//! Seeded from the cycle's taxonomy. A missing year is created on first
//! request; concurrent requests for the same year wait on that one creation
//! and reuse its id. A failed creation leaves the year unresolved so a later
//! request may try again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ieas_common::folders::year_folder_name;
use ieas_common::{Error, Result};
use tokio::sync::{Mutex, OnceCell};

use crate::catalog::LibraryCatalog;

#[derive(Debug, Default)]
pub struct YearFolders {
    cells: Mutex<HashMap<i32, Arc<OnceCell<String>>>>,
    created: AtomicUsize,
}

impl YearFolders {
    /// Registry knowing the given year -> folder id entries
    pub fn new(known: &HashMap<i32, String>) -> Self {
        let cells = known
            .iter()
            .map(|(year, id)| (*year, Arc::new(OnceCell::new_with(Some(id.clone())))))
            .collect();

        Self {
            cells: Mutex::new(cells),
            created: AtomicUsize::new(0),
        }
    }

    /// Folder id for `year`, creating the folder if the library lacks it
    ///
    /// Years without a valid default-folder name are rejected before any
    /// call is made.
    pub async fn ensure<L>(&self, library: &L, year: i32) -> Result<String>
    where
        L: LibraryCatalog + ?Sized,
    {
        let name = year_folder_name(year).ok_or_else(|| {
            Error::InvalidInput(format!("year {} has no default folder name", year))
        })?;

        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(year).or_default())
        };

        let id = cell
            .get_or_try_init(|| async {
                let folder = library.create_folder(&name, None).await?;
                self.created.fetch_add(1, Ordering::Relaxed);
                tracing::info!(year, folder_id = %folder.id, "Created default folder");
                Ok::<_, Error>(folder.id)
            })
            .await?;

        Ok(id.clone())
    }

    /// Folders created through this registry
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}
