//! On-disk item metadata records
//!
//! Eagle keeps one `metadata.json` per item under
//! `<library>/images/<itemId>.info/`. The format is private to Eagle and
//! may change between releases, so all knowledge of it stays behind
//! [`MetadataStore`].

use std::path::{Path, PathBuf};

use ieas_common::{Error, Result};
use serde_json::{json, Value};

/// Locate and patch per-item metadata records
///
/// `patch` is blocking; callers run it on a blocking thread.
pub trait MetadataStore: Send + Sync + 'static {
    /// Path of the record for `item_id`
    fn locate(&self, item_id: &str) -> PathBuf;

    /// Set creation/modification time (epoch seconds) and replace folder
    /// membership with `folder_id`, preserving every other field
    fn patch(&self, path: &Path, folder_id: &str, epoch_seconds: i64) -> Result<()>;
}

/// Eagle library on the local filesystem
#[derive(Debug, Clone)]
pub struct EagleMetadataStore {
    root: PathBuf,
}

impl EagleMetadataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MetadataStore for EagleMetadataStore {
    fn locate(&self, item_id: &str) -> PathBuf {
        self.root
            .join("images")
            .join(format!("{}.info", item_id))
            .join("metadata.json")
    }

    fn patch(&self, path: &Path, folder_id: &str, epoch_seconds: i64) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let mut record: Value = serde_json::from_str(&content)?;

        let fields = record.as_object_mut().ok_or_else(|| {
            Error::Decode(format!("{} is not a JSON object", path.display()))
        })?;
        fields.insert("btime".to_string(), json!(epoch_seconds));
        fields.insert("mtime".to_string(), json!(epoch_seconds));
        fields.insert("folders".to_string(), json!([folder_id]));

        std::fs::write(path, serde_json::to_vec(&record)?)?;
        Ok(())
    }
}
