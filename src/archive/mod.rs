//! Append-only archive of form-set snapshots.
//!
//! Every sync run that changes the catalog leaves one file behind in
//! `form_versions/`. Files are named `forms_<sequence>_<utc stamp>.json`;
//! the sequence is one past the highest already present, so two writes in
//! the same second never share a name. Files written by older releases
//! (`forms_<ctime>.json`, a bare identifier -> URL object) are still listed
//! and readable.

mod types;

pub use types::{diff_entries, ChangedForm, SnapshotDiff, SnapshotHandle, VersionSnapshot};

use crate::catalog::FormMap;
use crate::utils::{compute_hash, get_versions_path, now_file_stamp, now_iso};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};
use types::SnapshotFile;
use uuid::Uuid;
use walkdir::WalkDir;

static SEQUENCED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^forms_(\d+)_\d{8}T\d{6}\.json$").expect("valid snapshot pattern"));

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Snapshot {file} is corrupt: {reason}")]
    CorruptSnapshot { file: String, reason: String },

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

#[derive(Debug, Clone)]
pub struct VersionArchive {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl VersionArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Archive at `<data_dir>/form_versions`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(get_versions_path(data_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new snapshot holding `entries`
    pub async fn write(&self, entries: &FormMap) -> Result<SnapshotHandle, ArchiveError> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.dir).await?;

        let sequence = self.next_sequence()?;
        let snapshot = VersionSnapshot {
            sequence,
            id: Uuid::new_v4(),
            created_at: now_iso(),
            checksum: entries_checksum(entries)?,
            entries: entries.clone(),
        };

        let file_name = format!("forms_{:06}_{}.json", sequence, now_file_stamp());
        let path = self.dir.join(&file_name);
        let content = serde_json::to_string_pretty(&snapshot)?;

        // Staged under a name `list` skips, then linked into place, so a
        // failed write leaves no partial snapshot and an existing one is
        // never overwritten
        let staging = self.dir.join(format!("forms_{:06}.json.tmp", sequence));
        let published = async {
            fs::write(&staging, content.as_bytes()).await?;
            fs::hard_link(&staging, &path).await
        }
        .await;
        if let Err(e) = fs::remove_file(&staging).await {
            debug!(staging = %staging.display(), error = %e, "Staging file not removed");
        }
        published?;

        info!(
            snapshot = %file_name,
            sequence,
            forms = entries.len(),
            "Archived form snapshot"
        );

        Ok(SnapshotHandle {
            file_name,
            path,
            sequence: Some(sequence),
        })
    }

    /// All snapshots, newest first
    pub fn list(&self) -> Result<Vec<SnapshotHandle>, ArchiveError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut handles = Vec::new();

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "archive scan failed")
                })
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if !file_name.starts_with("forms_") || !file_name.ends_with(".json") {
                continue;
            }

            let sequence = parse_sequence(&file_name);
            handles.push(SnapshotHandle {
                file_name,
                path: entry.path().to_path_buf(),
                sequence,
            });
        }

        handles.sort_by(SnapshotHandle::newest_first);
        Ok(handles)
    }

    /// Newest snapshot, if any
    pub fn latest(&self) -> Result<Option<SnapshotHandle>, ArchiveError> {
        Ok(self.list()?.into_iter().next())
    }

    /// Resolve a snapshot by file name (with or without `.json`) or sequence number
    pub fn find(&self, name: &str) -> Result<SnapshotHandle, ArchiveError> {
        let wanted_sequence = name.parse::<u64>().ok();

        self.list()?
            .into_iter()
            .find(|handle| {
                handle.file_name == name
                    || handle.file_name.strip_suffix(".json") == Some(name)
                    || (wanted_sequence.is_some() && handle.sequence == wanted_sequence)
            })
            .ok_or_else(|| ArchiveError::SnapshotNotFound(name.to_string()))
    }

    /// Load one snapshot.
    ///
    /// Unparseable content or a checksum mismatch is reported as
    /// `CorruptSnapshot`.
    pub async fn read(&self, handle: &SnapshotHandle) -> Result<VersionSnapshot, ArchiveError> {
        let content = fs::read_to_string(&handle.path).await?;

        let corrupt = |reason: String| ArchiveError::CorruptSnapshot {
            file: handle.file_name.clone(),
            reason,
        };

        let parsed: SnapshotFile =
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        match parsed {
            SnapshotFile::Versioned(snapshot) => {
                let expected = entries_checksum(&snapshot.entries)?;
                if expected != snapshot.checksum {
                    return Err(corrupt(format!(
                        "checksum mismatch (stored {}, computed {})",
                        snapshot.checksum, expected
                    )));
                }
                Ok(snapshot)
            }
            SnapshotFile::Legacy(entries) => {
                debug!(snapshot = %handle.file_name, "Read legacy snapshot");
                let created_at = handle
                    .file_name
                    .trim_start_matches("forms_")
                    .trim_end_matches(".json")
                    .to_string();
                Ok(VersionSnapshot {
                    sequence: 0,
                    id: Uuid::nil(),
                    created_at,
                    checksum: entries_checksum(&entries)?,
                    entries,
                })
            }
        }
    }

    fn next_sequence(&self) -> Result<u64, ArchiveError> {
        let highest = self
            .list()?
            .iter()
            .filter_map(|handle| handle.sequence)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }
}

fn parse_sequence(file_name: &str) -> Option<u64> {
    SEQUENCED_NAME
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn entries_checksum(entries: &FormMap) -> Result<String, serde_json::Error> {
    Ok(compute_hash(&serde_json::to_string(entries)?))
}
