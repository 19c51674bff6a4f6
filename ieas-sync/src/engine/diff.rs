//! Set differences computed from a cycle snapshot
//!
//! Pure functions; every output list is sorted so a cycle issues its calls
//! in a stable order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::snapshot::CycleSnapshot;
use crate::models::RemoteAlbum;

/// Asset-level difference between the catalogs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetDiff {
    /// Server ids with no library item
    pub to_add: Vec<String>,
    /// Annotations with no server asset
    pub to_remove: Vec<String>,
    /// Ids present on both sides
    pub matched: Vec<String>,
}

/// Compare server ids against library annotations
pub fn diff_assets(snapshot: &CycleSnapshot) -> AssetDiff {
    let remote: BTreeSet<&String> = snapshot.remote.keys().collect();
    let library: BTreeSet<&String> = snapshot.library.keys().collect();

    AssetDiff {
        to_add: remote.difference(&library).map(|s| s.to_string()).collect(),
        to_remove: library.difference(&remote).map(|s| s.to_string()).collect(),
        matched: remote.intersection(&library).map(|s| s.to_string()).collect(),
    }
}

/// Album membership derived from matched items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    /// Named folder id -> server asset ids filed in it
    pub by_folder: BTreeMap<String, BTreeSet<String>>,
    /// Matched ids whose item sits in no named folder
    pub unorganized: Vec<String>,
}

impl Membership {
    /// Desired album members for `folder_id`
    pub fn members_of(&self, folder_id: &str) -> BTreeSet<String> {
        self.by_folder.get(folder_id).cloned().unwrap_or_default()
    }
}

/// Group matched ids by named folder
///
/// An item in several named folders is counted in each of them.
pub fn collect_membership(snapshot: &CycleSnapshot, matched: &[String]) -> Membership {
    let mut membership = Membership::default();

    for asset_id in matched {
        let Some(item) = snapshot.library.get(asset_id) else {
            continue;
        };

        let mut organized = false;
        for folder_id in &item.folders {
            if snapshot.taxonomy.is_named_folder(folder_id) {
                organized = true;
                membership
                    .by_folder
                    .entry(folder_id.clone())
                    .or_default()
                    .insert(asset_id.clone());
            }
        }

        if !organized {
            membership.unorganized.push(asset_id.clone());
        }
    }

    membership
}

/// Album-level work for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumPlan {
    /// Named folders with no linked album
    pub to_create: Vec<String>,
    /// Albums linked to no existing named folder, plus extra albums linked
    /// to a folder that already has one
    pub to_delete: Vec<RemoteAlbum>,
    /// (named folder id, linked album)
    pub to_sync: Vec<(String, RemoteAlbum)>,
}

/// Match albums to named folders through the album description
///
/// Albums with a blank description were not created by this service and
/// are never touched.
pub fn plan_albums(named_folders: &HashMap<String, String>, albums: &[RemoteAlbum]) -> AlbumPlan {
    let mut plan = AlbumPlan::default();
    let mut linked: BTreeMap<&str, &RemoteAlbum> = BTreeMap::new();

    let mut albums: Vec<&RemoteAlbum> = albums
        .iter()
        .filter(|a| !a.description.trim().is_empty())
        .collect();
    albums.sort_by(|a, b| a.id.cmp(&b.id));

    for album in albums {
        if linked.contains_key(album.description.as_str()) {
            tracing::warn!(
                album_id = %album.id,
                folder_id = %album.description,
                "Second album linked to the same folder"
            );
            plan.to_delete.push(album.clone());
            continue;
        }
        linked.insert(album.description.as_str(), album);
    }

    let mut folder_ids: Vec<&String> = named_folders.keys().collect();
    folder_ids.sort();

    for folder_id in folder_ids {
        match linked.remove(folder_id.as_str()) {
            Some(album) => plan.to_sync.push((folder_id.clone(), album.clone())),
            None => plan.to_create.push(folder_id.clone()),
        }
    }

    plan.to_delete.extend(linked.into_values().cloned());
    plan.to_delete.sort_by(|a, b| a.id.cmp(&b.id));
    plan
}

/// Membership change for one album
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberDelta {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl MemberDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Symmetric difference between current and desired album members
pub fn member_delta(current: &BTreeSet<String>, desired: &BTreeSet<String>) -> MemberDelta {
    MemberDelta {
        to_add: desired.difference(current).cloned().collect(),
        to_remove: current.difference(desired).cloned().collect(),
    }
}
