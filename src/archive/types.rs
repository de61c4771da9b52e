use crate::catalog::FormMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use uuid::Uuid;

/// One immutable archived copy of an extracted form set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    /// Monotonic position in the archive (0 for legacy files)
    pub sequence: u64,
    pub id: Uuid,
    pub created_at: String,
    /// SHA-256 of the compact JSON encoding of `entries`
    pub checksum: String,
    pub entries: FormMap,
}

/// A snapshot file as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHandle {
    pub file_name: String,
    pub path: PathBuf,
    /// `None` for legacy `forms_<ctime>.json` files
    pub sequence: Option<u64>,
}

impl SnapshotHandle {
    /// Newest first: sequenced snapshots by descending sequence, then
    /// legacy files by descending file name
    pub fn newest_first(a: &SnapshotHandle, b: &SnapshotHandle) -> Ordering {
        match (a.sequence, b.sequence) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.file_name.cmp(&a.file_name),
        }
    }
}

/// Accepted on-disk layouts
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum SnapshotFile {
    Versioned(VersionSnapshot),
    Legacy(FormMap),
}

/// A form whose URL moved between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedForm {
    pub identifier: String,
    pub old_url: String,
    pub new_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<(String, String)>,
    pub removed: Vec<(String, String)>,
    pub changed: Vec<ChangedForm>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare two entry sets; results are ordered by identifier
pub fn diff_entries(old: &FormMap, new: &FormMap) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();

    for (identifier, new_url) in new {
        match old.get(identifier) {
            None => diff.added.push((identifier.clone(), new_url.clone())),
            Some(old_url) if old_url != new_url => diff.changed.push(ChangedForm {
                identifier: identifier.clone(),
                old_url: old_url.clone(),
                new_url: new_url.clone(),
            }),
            Some(_) => {}
        }
    }

    for (identifier, old_url) in old {
        if !new.contains_key(identifier) {
            diff.removed.push((identifier.clone(), old_url.clone()));
        }
    }

    diff
}
