//! Uploaded image storage
//!
//! Images are written under `<root>/uploads/` with a random file name. The
//! returned image reference is the path relative to the root folder, which is
//! also the URL path the upload directory is served under.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use cleancity_common::config::UPLOADS_DIR;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Store images in `dir` (normally `<root>/uploads`)
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the image and return its reference, e.g. `uploads/<uuid>.jpg`
    pub async fn save(&self, bytes: &[u8]) -> Result<String> {
        let extension = infer::get(bytes).map(|kind| kind.extension()).unwrap_or("bin");
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        let image_ref = format!("{}/{}", UPLOADS_DIR, file_name);
        debug!(image_ref = %image_ref, size = bytes.len(), "Stored uploaded image");
        Ok(image_ref)
    }

    /// Delete a previously saved image; missing files are ignored
    pub async fn remove(&self, image_ref: &str) -> Result<()> {
        let path = self.resolve(image_ref)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(image_ref = %image_ref, error = %e, "Failed to remove image");
                Err(e.into())
            }
        }
    }

    /// Map a reference back to a file path inside the upload directory
    fn resolve(&self, image_ref: &str) -> Result<PathBuf> {
        let file_name = image_ref
            .strip_prefix(UPLOADS_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
            .ok_or_else(|| Error::InvalidInput(format!("not an upload reference: {}", image_ref)))?;
        Ok(self.dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        let image_ref = store.save(&JPEG_MAGIC).await.unwrap();
        assert!(image_ref.starts_with("uploads/"));
        assert!(image_ref.ends_with(".jpg"));

        let file = dir.path().join(&image_ref);
        assert!(file.exists());

        store.remove(&image_ref).await.unwrap();
        assert!(!file.exists());
        // Second removal is a no-op
        store.remove(&image_ref).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_format_gets_bin_extension() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        let image_ref = store.save(b"not an image").await.unwrap();
        assert!(image_ref.ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_remove_rejects_paths_outside_uploads() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path().join("uploads"));

        assert!(store.remove("uploads/../cleancity.db").await.is_err());
        assert!(store.remove("/etc/passwd").await.is_err());
    }
}
