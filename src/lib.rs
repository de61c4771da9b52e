pub mod archive;
pub mod catalog;
pub mod config;
pub mod download;
pub mod extract;
pub mod http;
pub mod reconcile;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use archive::{
    diff_entries, ArchiveError, SnapshotDiff, SnapshotHandle, VersionArchive, VersionSnapshot,
};
pub use catalog::{
    default_data_dir, default_forms, Catalog, CatalogError, CatalogService, CatalogStore,
    FormEntry, FormMap, LastChecked, Theme,
};
pub use config::{read_config, write_config, AppConfig, ConfigError};
pub use download::{DownloadError, DownloadFailure, DownloadReport, DownloadedForm, Downloader};
pub use extract::{parse_anchors, Anchor, FormExtractor, HeuristicExtractor};
pub use http::{FetchError, HttpClient, HttpListingSource, HttpResponse, ListingSource};
pub use reconcile::{reconcile, reconcile_with_policy, Reconciliation, RetentionPolicy};
pub use sync::{SyncError, SyncOrchestrator, SyncResult};
