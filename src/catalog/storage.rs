use super::types::Catalog;
use super::CatalogError;
use crate::utils::{get_catalog_path, DATA_FOLDER};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Get the default data directory (~/.uscis-forms)
pub fn default_data_dir() -> Result<PathBuf, CatalogError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| CatalogError::HomeDirNotFound)?;

    Ok(PathBuf::from(home).join(DATA_FOLDER))
}

/// Reads and writes the single persisted catalog record
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `<data_dir>/config.json`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(get_catalog_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the catalog from disk.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet and an error
    /// when the record exists but cannot be parsed.
    pub async fn load(&self) -> Result<Option<Catalog>, CatalogError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        Ok(Some(catalog))
    }

    /// Overwrite the record in full, via temp file + rename
    pub async fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(catalog)?;
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}
