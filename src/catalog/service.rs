use super::storage::CatalogStore;
use super::types::{Catalog, Theme};
use super::CatalogError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/]+\S*$").expect("valid URL pattern"));

/// Single owner of the shared catalog.
///
/// Cloning is cheap and every clone sees the same state. Each mutation
/// holds the lock for its whole read-modify-write, persistence included,
/// so user edits and a background sync never interleave.
#[derive(Debug, Clone)]
pub struct CatalogService {
    store: CatalogStore,
    catalog: Arc<Mutex<Catalog>>,
}

impl CatalogService {
    /// Load the persisted catalog, falling back to the built-in table when
    /// the record is missing or unreadable
    pub async fn open(store: CatalogStore) -> Self {
        let catalog = match store.load().await {
            Ok(Some(catalog)) => catalog,
            Ok(None) => {
                info!(path = %store.path().display(), "No saved catalog, using built-in forms");
                Catalog::default()
            }
            Err(e) => {
                warn!(
                    path = %store.path().display(),
                    error = %e,
                    "Saved catalog is unreadable, using built-in forms"
                );
                Catalog::default()
            }
        };

        Self::with_catalog(store, catalog)
    }

    pub fn with_catalog(store: CatalogStore, catalog: Catalog) -> Self {
        Self {
            store,
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Snapshot of the current state
    pub async fn get(&self) -> Catalog {
        self.catalog.lock().await.clone()
    }

    /// Apply `f` and persist the result while holding the lock.
    ///
    /// A failed save does not roll back the in-memory change.
    pub async fn update<T, F>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, CatalogError>,
    {
        let mut guard = self.catalog.lock().await;
        let value = f(&mut *guard)?;
        self.store.save(&*guard).await?;
        Ok(value)
    }

    /// Persist the current state
    pub async fn save(&self) -> Result<(), CatalogError> {
        let guard = self.catalog.lock().await;
        self.store.save(&*guard).await
    }

    /// Acquire the catalog lock for a multi-step transaction
    /// (caller persists with [`CatalogService::save_locked`])
    pub async fn lock(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().await
    }

    /// Persist without acquiring the lock (caller must hold it)
    pub async fn save_locked(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        self.store.save(catalog).await
    }

    /// Add a user form; an identifier already in the catalog is rejected
    pub async fn add_form(&self, identifier: &str, url: &str) -> Result<(), CatalogError> {
        let (identifier, url) = validate_form(identifier, url)?;

        self.update(|catalog| {
            if catalog.forms.contains_key(&identifier) {
                return Err(CatalogError::DuplicateForm(identifier));
            }
            catalog.forms.insert(identifier.clone(), url);
            catalog.custom_forms.insert(identifier.clone());
            info!(form = %identifier, "Added form");
            Ok(())
        })
        .await
    }

    /// Edit an existing form, optionally renaming it
    pub async fn edit_form(
        &self,
        identifier: &str,
        new_identifier: Option<&str>,
        new_url: Option<&str>,
    ) -> Result<(), CatalogError> {
        let identifier = identifier.trim().to_string();

        self.update(|catalog| {
            let current_url = catalog
                .forms
                .get(&identifier)
                .cloned()
                .ok_or_else(|| CatalogError::FormNotFound(identifier.clone()))?;

            let (target, url) = validate_form(
                new_identifier.unwrap_or(&identifier),
                new_url.unwrap_or(&current_url),
            )?;

            if target != identifier && catalog.forms.contains_key(&target) {
                return Err(CatalogError::DuplicateForm(target));
            }

            catalog.forms.remove(&identifier);
            let was_custom = catalog.custom_forms.remove(&identifier);
            // A user-edited URL makes the entry the user's own
            if was_custom || target != identifier || url != current_url {
                catalog.custom_forms.insert(target.clone());
            }
            catalog.forms.insert(target.clone(), url);

            info!(form = %identifier, renamed_to = %target, "Edited form");
            Ok(())
        })
        .await
    }

    pub async fn remove_form(&self, identifier: &str) -> Result<(), CatalogError> {
        let identifier = identifier.trim().to_string();

        self.update(|catalog| {
            if catalog.forms.remove(&identifier).is_none() {
                return Err(CatalogError::FormNotFound(identifier));
            }
            catalog.custom_forms.remove(&identifier);
            info!(form = %identifier, "Removed form");
            Ok(())
        })
        .await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), CatalogError> {
        self.update(|catalog| {
            catalog.theme = theme;
            Ok(())
        })
        .await
    }

    pub async fn set_last_folder(&self, folder: &str) -> Result<(), CatalogError> {
        let folder = folder.to_string();
        self.update(|catalog| {
            catalog.last_folder = folder;
            Ok(())
        })
        .await
    }
}

/// Trim and check a user-supplied (identifier, url) pair
fn validate_form(identifier: &str, url: &str) -> Result<(String, String), CatalogError> {
    let identifier = identifier.trim();
    let url = url.trim();

    if identifier.is_empty() || url.is_empty() {
        return Err(CatalogError::InvalidForm(
            "both a form name and a URL are required".to_string(),
        ));
    }
    if !URL_PATTERN.is_match(url) {
        return Err(CatalogError::InvalidForm(format!(
            "'{url}' is not an absolute http(s) URL"
        )));
    }

    Ok((identifier.to_string(), url.to_string()))
}
