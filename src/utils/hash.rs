use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

/// Compute SHA-256 hash of a string
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 hash of a downloaded file's bytes
pub async fn compute_file_hash(path: &Path) -> Result<String, std::io::Error> {
    let content = fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}
