mod defaults;
mod service;
mod storage;
mod types;

pub use defaults::{default_forms, DEFAULT_FORM_COUNT};
pub use service::CatalogService;
pub use storage::{default_data_dir, CatalogStore};
pub use types::{Catalog, FormEntry, FormMap, LastChecked, Theme};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Form already exists: {0}")]
    DuplicateForm(String),

    #[error("Form not found in catalog: {0}")]
    FormNotFound(String),

    #[error("Invalid form: {0}")]
    InvalidForm(String),

    #[error("Home directory not found")]
    HomeDirNotFound,
}
