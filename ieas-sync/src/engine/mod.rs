//! Reconciliation engine
//!
//! One cycle, repeated at a fixed interval:
//!
//! 1. Load the library taxonomy (year folders and their named children)
//! 2. Load both catalogs into a [`CycleSnapshot`]
//! 3. Diff server ids against library annotations
//! 4. Import missing assets through the bridge URL
//! 5. Trash library items whose asset left the server, in one batch call
//! 6. Collect named-folder membership; queue corrections for unorganized items
//! 7. Create, delete and sync albums to mirror named folders
//!
//! Phases run strictly in order. Per-item work inside phases 4 and 7 fans
//! out with at most `concurrency` calls in flight. An error that escapes a
//! phase abandons the rest of the cycle; the next cycle re-diffs from
//! scratch.

pub mod diff;
pub mod snapshot;
pub mod year_folders;

pub use diff::{AlbumPlan, AssetDiff, MemberDelta, Membership};
pub use snapshot::{CycleSnapshot, Taxonomy};
pub use year_folders::YearFolders;

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use ieas_common::folders::year_folder_name;
use ieas_common::time::{parse_utc, year_of};
use ieas_common::Result;
use tokio_util::sync::CancellationToken;

use crate::bridge::asset_url;
use crate::catalog::{LibraryCatalog, ServerCatalog};
use crate::correction::{CorrectionSender, CorrectionTask};
use crate::models::{ImportRequest, RemoteAlbum};

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Pause between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Maximum in-flight calls within a fan-out phase
    pub concurrency: usize,
    /// Server assets per listing page
    pub page_size: usize,
    /// Base URL of the bridge proxy as seen by the library
    pub bridge_url: String,
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub added: usize,
    pub add_failed: usize,
    pub trashed: usize,
    pub corrections: usize,
    pub folders_created: usize,
    pub albums_created: usize,
    pub albums_deleted: usize,
    pub albums_synced: usize,
    pub albums_renamed: usize,
    pub album_failures: usize,
}

#[derive(Debug)]
enum AlbumOp {
    Create {
        folder_id: String,
        name: String,
        members: BTreeSet<String>,
    },
    Delete {
        album: RemoteAlbum,
    },
    Sync {
        folder_id: String,
        name: String,
        album_id: String,
        members: BTreeSet<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlbumOutcome {
    Created,
    Deleted,
    Synced { changed: bool, renamed: bool },
    Failed,
}

/// Drives the library toward the server's observed state
pub struct Engine<L, S> {
    library: L,
    server: S,
    corrections: CorrectionSender,
    config: EngineConfig,
}

impl<L, S> Engine<L, S>
where
    L: LibraryCatalog,
    S: ServerCatalog,
{
    pub fn new(library: L, server: S, corrections: CorrectionSender, config: EngineConfig) -> Self {
        Self {
            library,
            server,
            corrections,
            config,
        }
    }

    /// Run cycles until `shutdown` is cancelled
    ///
    /// A failed cycle is logged and followed by the usual pause.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            concurrency = self.config.concurrency,
            "Reconciliation engine started"
        );

        loop {
            tracing::info!("Starting API scan for data changes...");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.run_cycle() => match result {
                    Ok(report) => tracing::info!(
                        added = report.added,
                        add_failed = report.add_failed,
                        trashed = report.trashed,
                        corrections = report.corrections,
                        folders_created = report.folders_created,
                        albums_created = report.albums_created,
                        albums_deleted = report.albums_deleted,
                        albums_synced = report.albums_synced,
                        albums_renamed = report.albums_renamed,
                        album_failures = report.album_failures,
                        "Reconciliation cycle complete"
                    ),
                    Err(e) => tracing::error!(error = ?e, "Reconciliation cycle failed"),
                },
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        tracing::info!("Reconciliation engine stopped");
    }

    /// One full fetch-diff-mutate pass
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let snapshot =
            CycleSnapshot::load(&self.library, &self.server, self.config.page_size).await?;
        let years = YearFolders::new(&snapshot.taxonomy.year_folders);
        let diff = diff::diff_assets(&snapshot);

        tracing::debug!(
            to_add = diff.to_add.len(),
            to_remove = diff.to_remove.len(),
            matched = diff.matched.len(),
            "Asset diff"
        );

        let (added, add_failed) = self.add_assets(&snapshot, &years, &diff.to_add).await;
        report.added = added;
        report.add_failed = add_failed;

        report.trashed = self.trash_items(&snapshot, &diff.to_remove).await?;

        let membership = diff::collect_membership(&snapshot, &diff.matched);
        report.corrections = self
            .enqueue_corrections(&snapshot, &years, &membership.unorganized)
            .await?;
        report.folders_created = years.created();

        self.sync_albums(&snapshot.taxonomy, &membership, &mut report)
            .await?;

        Ok(report)
    }

    /// Phase 4: import every missing asset; returns (added, failed)
    async fn add_assets(
        &self,
        snapshot: &CycleSnapshot,
        years: &YearFolders,
        to_add: &[String],
    ) -> (usize, usize) {
        let results: Vec<bool> = stream::iter(to_add)
            .map(|asset_id| self.add_asset(snapshot, years, asset_id))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let added = results.iter().filter(|ok| **ok).count();
        (added, results.len() - added)
    }

    async fn add_asset(&self, snapshot: &CycleSnapshot, years: &YearFolders, asset_id: &str) -> bool {
        let Some(asset) = snapshot.remote.get(asset_id) else {
            return false;
        };

        let year = match year_of(&asset.local_date_time) {
            Ok(year) => year,
            Err(e) => {
                tracing::warn!(asset_id = %asset_id, error = %e, "Cannot derive year; skipping import");
                return false;
            }
        };
        if year_folder_name(year).is_none() {
            tracing::warn!(asset_id = %asset_id, year, "Year outside default folder range; skipping import");
            return false;
        }

        let folder_id = match years.ensure(&self.library, year).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    asset_id = %asset_id,
                    year,
                    error = %e,
                    "Failed to create default folder; skipping import"
                );
                return false;
            }
        };

        let request = ImportRequest {
            url: asset_url(&self.config.bridge_url, asset.asset_type, &asset.id),
            name: file_stem(&asset.original_file_name),
            annotation: asset.id.clone(),
            folder_id: Some(folder_id),
        };

        match self.library.add_from_url(&request).await {
            Ok(()) => {
                tracing::info!(asset_id = %asset_id, name = %request.name, "Imported asset");
                true
            }
            Err(e) => {
                tracing::warn!(asset_id = %asset_id, error = %e, "Failed to import asset");
                false
            }
        }
    }

    /// Phase 5: trash stale items (and annotation duplicates) in one call
    async fn trash_items(&self, snapshot: &CycleSnapshot, to_remove: &[String]) -> Result<usize> {
        let mut item_ids: Vec<String> = to_remove
            .iter()
            .filter_map(|annotation| snapshot.library.get(annotation))
            .map(|item| item.id.clone())
            .collect();
        item_ids.extend(snapshot.duplicates.iter().map(|item| item.id.clone()));

        if item_ids.is_empty() {
            return Ok(0);
        }

        self.library.move_to_trash(&item_ids).await?;
        tracing::info!(count = item_ids.len(), "Moved items to trash");
        Ok(item_ids.len())
    }

    /// Phase 6: queue year-folder corrections for unorganized items
    async fn enqueue_corrections(
        &self,
        snapshot: &CycleSnapshot,
        years: &YearFolders,
        unorganized: &[String],
    ) -> Result<usize> {
        let mut queued = 0;

        for asset_id in unorganized {
            let (Some(item), Some(asset)) =
                (snapshot.library.get(asset_id), snapshot.remote.get(asset_id))
            else {
                continue;
            };

            let (year, timestamp) =
                match (year_of(&asset.local_date_time), parse_utc(&asset.file_created_at)) {
                    (Ok(year), Ok(timestamp)) => (year, timestamp),
                    (Err(e), _) | (_, Err(e)) => {
                        tracing::warn!(asset_id = %asset_id, error = %e, "Unparseable asset timestamp");
                        continue;
                    }
                };
            if year_folder_name(year).is_none() {
                tracing::warn!(asset_id = %asset_id, year, "Year outside default folder range; skipping correction");
                continue;
            }

            let folder_id = match years.ensure(&self.library, year).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(asset_id = %asset_id, year, error = %e, "Failed to create default folder");
                    continue;
                }
            };

            // Suspends while the queue is full
            self.corrections
                .enqueue(CorrectionTask {
                    item_id: item.id.clone(),
                    folder_id,
                    timestamp,
                })
                .await?;
            queued += 1;
        }

        Ok(queued)
    }

    /// Phase 7: mirror named folders as albums
    async fn sync_albums(
        &self,
        taxonomy: &Taxonomy,
        membership: &Membership,
        report: &mut CycleReport,
    ) -> Result<()> {
        let albums = self.server.list_albums().await?;
        let plan = diff::plan_albums(&taxonomy.named_folders, &albums);

        let folder_name = |folder_id: &str| {
            taxonomy
                .named_folders
                .get(folder_id)
                .cloned()
                .unwrap_or_default()
        };

        let mut ops = Vec::with_capacity(plan.to_create.len() + plan.to_delete.len() + plan.to_sync.len());
        for folder_id in plan.to_create {
            ops.push(AlbumOp::Create {
                name: folder_name(&folder_id),
                members: membership.members_of(&folder_id),
                folder_id,
            });
        }
        for album in plan.to_delete {
            ops.push(AlbumOp::Delete { album });
        }
        for (folder_id, album) in plan.to_sync {
            ops.push(AlbumOp::Sync {
                name: folder_name(&folder_id),
                members: membership.members_of(&folder_id),
                album_id: album.id,
                folder_id,
            });
        }

        let outcomes: Vec<AlbumOutcome> = stream::iter(ops)
            .map(|op| self.apply_album_op(op))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                AlbumOutcome::Created => report.albums_created += 1,
                AlbumOutcome::Deleted => report.albums_deleted += 1,
                AlbumOutcome::Synced { changed, renamed } => {
                    if changed {
                        report.albums_synced += 1;
                    }
                    if renamed {
                        report.albums_renamed += 1;
                    }
                }
                AlbumOutcome::Failed => report.album_failures += 1,
            }
        }

        Ok(())
    }

    async fn apply_album_op(&self, op: AlbumOp) -> AlbumOutcome {
        match op {
            AlbumOp::Create {
                folder_id,
                name,
                members,
            } => {
                let asset_ids: Vec<String> = members.into_iter().collect();
                match self.server.create_album(&name, &folder_id, &asset_ids).await {
                    Ok(album) => {
                        tracing::info!(
                            album_id = %album.id,
                            folder_id = %folder_id,
                            name = %name,
                            assets = asset_ids.len(),
                            "Created album"
                        );
                        AlbumOutcome::Created
                    }
                    Err(e) => {
                        tracing::warn!(folder_id = %folder_id, error = %e, "Failed to create album");
                        AlbumOutcome::Failed
                    }
                }
            }
            AlbumOp::Delete { album } => match self.server.delete_album(&album.id).await {
                Ok(()) => {
                    tracing::info!(
                        album_id = %album.id,
                        folder_id = %album.description,
                        "Deleted album"
                    );
                    AlbumOutcome::Deleted
                }
                Err(e) => {
                    tracing::warn!(album_id = %album.id, error = %e, "Failed to delete album");
                    AlbumOutcome::Failed
                }
            },
            AlbumOp::Sync {
                folder_id,
                name,
                album_id,
                members,
            } => match self.sync_album(&album_id, &name, &members).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        album_id = %album_id,
                        folder_id = %folder_id,
                        error = %e,
                        "Failed to sync album"
                    );
                    AlbumOutcome::Failed
                }
            },
        }
    }

    async fn sync_album(
        &self,
        album_id: &str,
        name: &str,
        desired: &BTreeSet<String>,
    ) -> Result<AlbumOutcome> {
        let album = self.server.get_album(album_id).await?;
        let delta = diff::member_delta(&album.asset_ids(), desired);

        if !delta.to_add.is_empty() {
            self.server.add_album_assets(album_id, &delta.to_add).await?;
        }
        if !delta.to_remove.is_empty() {
            self.server
                .remove_album_assets(album_id, &delta.to_remove)
                .await?;
        }
        if !delta.is_empty() {
            tracing::info!(
                album_id = %album_id,
                added = delta.to_add.len(),
                removed = delta.to_remove.len(),
                "Synced album members"
            );
        }

        let renamed = !name.is_empty() && album.album_name != name;
        if renamed {
            self.server.rename_album(album_id, name).await?;
            tracing::info!(album_id = %album_id, from = %album.album_name, to = %name, "Renamed album");
        }

        Ok(AlbumOutcome::Synced {
            changed: !delta.is_empty(),
            renamed,
        })
    }
}

/// Item name used on import: the original file name without extension
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
