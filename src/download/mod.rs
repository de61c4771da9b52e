use crate::catalog::Catalog;
use crate::http::HttpClient;
use crate::utils::compute_file_hash;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Extension given to every downloaded form
pub const FORM_EXTENSION: &str = "pdf";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Select at least one form.")]
    NoFormsSelected,

    #[error("Select a download folder.")]
    NoFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedForm {
    pub identifier: String,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub identifier: String,
    pub message: String,
}

/// Per-item outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub succeeded: Vec<DownloadedForm>,
    pub failed: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!(
                "All {} selected forms downloaded successfully.",
                self.succeeded.len()
            )
        } else {
            format!(
                "Download finished with {} error(s); {} succeeded.",
                self.failed.len(),
                self.succeeded.len()
            )
        }
    }
}

/// Sequential batch downloader
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    delay: Duration,
}

impl Downloader {
    pub fn new(client: HttpClient, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Download each selected form into `folder` as `<identifier>.pdf`.
    ///
    /// A failing item is recorded and the batch moves on; only an empty
    /// selection, a missing folder or an uncreatable folder fail the call.
    pub async fn download(
        &self,
        selection: &[String],
        catalog: &Catalog,
        folder: &Path,
    ) -> Result<DownloadReport, DownloadError> {
        if folder.as_os_str().is_empty() {
            return Err(DownloadError::NoFolder);
        }
        if selection.is_empty() {
            return Err(DownloadError::NoFormsSelected);
        }

        fs::create_dir_all(folder).await?;

        let mut report = DownloadReport::default();

        for (index, identifier) in selection.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.download_one(identifier, catalog, folder).await {
                Ok(form) => {
                    info!(form = %identifier, path = %form.path.display(), "Downloaded");
                    report.succeeded.push(form);
                }
                Err(reason) => {
                    let message = format!("{identifier} failed: {reason}");
                    warn!(form = %identifier, reason = %reason, "Download failed");
                    report.failed.push(DownloadFailure {
                        identifier: identifier.clone(),
                        message,
                    });
                }
            }
        }

        Ok(report)
    }

    async fn download_one(
        &self,
        identifier: &str,
        catalog: &Catalog,
        folder: &Path,
    ) -> Result<DownloadedForm, String> {
        let url = catalog
            .get(identifier)
            .ok_or_else(|| "not in catalog".to_string())?;

        let resp = self.client.get(url).await.map_err(|e| e.to_string())?;

        if !resp.is_ok() {
            return Err(format!("HTTP status {}", resp.status));
        }
        let content_type = resp.content_type.as_deref().unwrap_or("");
        if !content_type.to_lowercase().contains("pdf") {
            return Err(format!("invalid content type '{content_type}'"));
        }

        let path = folder.join(form_file_name(identifier));
        fs::write(&path, &resp.body)
            .await
            .map_err(|e| e.to_string())?;
        let sha256 = compute_file_hash(&path).await.map_err(|e| e.to_string())?;

        Ok(DownloadedForm {
            identifier: identifier.to_string(),
            path,
            sha256,
        })
    }
}

/// `<identifier>.pdf`, with path separators made safe
pub fn form_file_name(identifier: &str) -> String {
    let safe: String = identifier
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{safe}.{FORM_EXTENSION}")
}
