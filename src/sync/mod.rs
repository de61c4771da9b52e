//! One end-to-end synchronization attempt against the live listing.
//!
//! A run fetches the listing, extracts candidates, reconciles them against
//! the catalog, archives a snapshot when something changed and persists the
//! catalog. Errors before reconciliation abort the run with the catalog and
//! archive untouched; every outcome is folded into a [`SyncResult`].

use crate::archive::{ArchiveError, SnapshotHandle, VersionArchive};
use crate::catalog::{CatalogService, LastChecked};
use crate::extract::FormExtractor;
use crate::http::{FetchError, ListingSource};
use crate::reconcile::{reconcile_with_policy, RetentionPolicy};
use crate::utils::now_iso;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("sync already in progress")]
    Busy,

    #[error("could not fetch form listing: {0}")]
    Fetch(#[from] FetchError),

    #[error("could not archive snapshot: {0}")]
    Archive(#[from] ArchiveError),
}

/// Summary of one run, for presentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub changed: bool,
    pub entries_found: usize,
    pub error: Option<String>,
    /// Snapshot written by this run, when `changed`
    pub snapshot: Option<SnapshotHandle>,
    /// Non-fatal problems, e.g. the catalog could not be saved
    pub warnings: Vec<String>,
}

impl SyncResult {
    fn failed(err: &SyncError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// One-line message for the user
    pub fn summary(&self) -> String {
        match (&self.error, self.changed) {
            (Some(e), _) => format!("Update failed: {e}"),
            (None, true) => format!("Forms updated successfully ({} found).", self.entries_found),
            (None, false) => format!("No updates found ({} found).", self.entries_found),
        }
    }
}

/// Clears the busy flag when a run ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncOrchestrator {
    source: Arc<dyn ListingSource>,
    extractor: Arc<dyn FormExtractor>,
    catalog: CatalogService,
    archive: VersionArchive,
    policy: RetentionPolicy,
    busy: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        source: Arc<dyn ListingSource>,
        extractor: Arc<dyn FormExtractor>,
        catalog: CatalogService,
        archive: VersionArchive,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            source,
            extractor,
            catalog,
            archive,
            policy,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one sync; never panics or returns an error, failures land in
    /// `SyncResult::error`
    pub async fn run(&self) -> SyncResult {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Sync requested while another sync is running");
            return SyncResult::failed(&SyncError::Busy);
        }
        let _busy = BusyGuard(&self.busy);

        match self.run_inner().await {
            Ok(result) => result,
            Err(e) => {
                error!(source = %self.source.label(), error = %e, "Sync failed");
                SyncResult::failed(&e)
            }
        }
    }

    /// Run on the tokio runtime without blocking the caller
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<SyncResult> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run().await })
    }

    async fn run_inner(&self) -> Result<SyncResult, SyncError> {
        info!(source = %self.source.label(), "Checking for form updates");

        let markup = self.source.fetch_listing().await?;
        let candidates = self.extractor.extract(&markup);
        let entries_found = candidates.len();

        // Hold the catalog for the rest of the run so user edits cannot
        // slip in between reconcile and save
        let mut catalog = self.catalog.lock().await;

        let outcome =
            reconcile_with_policy(&catalog.forms, &catalog.custom_forms, candidates, self.policy);

        let snapshot = if outcome.changed {
            Some(self.archive.write(&outcome.extracted).await?)
        } else {
            None
        };

        if outcome.changed {
            catalog.custom_forms.retain(|id| outcome.forms.contains_key(id));
            catalog.forms = outcome.forms;
        }
        catalog.form_versions = outcome.extracted;
        catalog.last_checked = LastChecked::At(now_iso());

        let mut warnings = Vec::new();
        if let Err(e) = self.catalog.save_locked(&catalog).await {
            warn!(error = %e, "Failed to save catalog after sync");
            warnings.push(format!("catalog not saved: {e}"));
        }

        info!(
            changed = outcome.changed,
            found = entries_found,
            retained = outcome.retained.len(),
            total = catalog.forms.len(),
            "Sync finished"
        );

        Ok(SyncResult {
            changed: outcome.changed,
            entries_found,
            error: None,
            snapshot,
            warnings,
        })
    }
}
