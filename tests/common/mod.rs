#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uscis_forms::{
    Catalog, CatalogService, CatalogStore, FormMap, HeuristicExtractor, HttpClient,
    HttpListingSource, RetentionPolicy, SyncOrchestrator, VersionArchive,
};

pub const I765_URL: &str = "https://www.uscis.gov/sites/default/files/document/forms/i-765.pdf";

/// Create a temporary data directory
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

pub fn forms(pairs: &[(&str, &str)]) -> FormMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Listing page with one anchor per (text, href) pair
pub fn listing_html(anchors: &[(&str, &str)]) -> String {
    let links: String = anchors
        .iter()
        .map(|(text, href)| format!("<li><a href=\"{href}\">{text}</a></li>\n"))
        .collect();
    format!("<html><body><ul>\n{links}</ul></body></html>")
}

/// Persist `catalog` into `data_dir` and open a service over it
pub async fn open_catalog(data_dir: &Path, catalog: Catalog) -> CatalogService {
    let store = CatalogStore::in_data_dir(data_dir);
    store.save(&catalog).await.expect("Should seed catalog");
    CatalogService::open(store).await
}

/// Orchestrator pointed at `index_url` with the default extractor
pub fn orchestrator(
    index_url: &str,
    catalog: &CatalogService,
    data_dir: &Path,
    policy: RetentionPolicy,
) -> Arc<SyncOrchestrator> {
    orchestrator_with_timeout(index_url, catalog, data_dir, policy, Duration::from_secs(5))
}

pub fn orchestrator_with_timeout(
    index_url: &str,
    catalog: &CatalogService,
    data_dir: &Path,
    policy: RetentionPolicy,
    timeout: Duration,
) -> Arc<SyncOrchestrator> {
    let source = HttpListingSource::new(HttpClient::new(timeout), index_url);
    Arc::new(SyncOrchestrator::new(
        Arc::new(source),
        Arc::new(HeuristicExtractor::default()),
        catalog.clone(),
        VersionArchive::in_data_dir(data_dir),
        policy,
    ))
}
