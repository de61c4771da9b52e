mod hash;

pub use hash::{compute_hash, compute_file_hash};

use std::path::{Path, PathBuf};

/// The name of the per-user data folder
pub const DATA_FOLDER: &str = ".uscis-forms";

/// The name of the persisted catalog record
pub const CATALOG_FILE: &str = "config.json";

/// The name of the optional runtime settings file
pub const SETTINGS_FILE: &str = "settings.json";

/// The name of the snapshot archive folder
pub const VERSIONS_DIR: &str = "form_versions";

/// Get the path to the catalog record inside a data directory
pub fn get_catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

/// Get the path to the snapshot archive inside a data directory
pub fn get_versions_path(data_dir: &Path) -> PathBuf {
    data_dir.join(VERSIONS_DIR)
}

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Filesystem-safe compact UTC timestamp, e.g. `20261016T093012`
pub fn now_file_stamp() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string()
}
