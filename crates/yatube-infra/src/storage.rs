//! Local filesystem media storage.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use yatube_core::ports::{ImageStore, StorageError};
use yatube_core::validation::DecodedImage;

/// Directory (relative to the media root) holding post images.
const POSTS_DIR: &str = "posts";

/// Writes uploaded images below a media root served under `base_url`.
pub struct FileSystemImageStore {
    root: PathBuf,
    base_url: String,
}

impl FileSystemImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }
}

#[async_trait]
impl ImageStore for FileSystemImageStore {
    async fn save(&self, image: DecodedImage) -> Result<String, StorageError> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let name = format!("{}.{}", Uuid::new_v4(), image.format.extension());
        tokio::fs::write(dir.join(&name), &image.bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let path = format!("{POSTS_DIR}/{name}");
        tracing::debug!(%path, bytes = image.bytes.len(), "Stored image");
        Ok(path)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(self.root.join(path))
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tracing::debug!(%path, "Removed image");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yatube_core::validation::ImageFormat;

    #[tokio::test]
    async fn test_save_writes_under_posts() {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::new_v4()));
        let store = FileSystemImageStore::new(&root, "/media");

        let path = store
            .save(DecodedImage {
                bytes: b"GIF89a-payload".to_vec(),
                format: ImageFormat::Gif,
            })
            .await
            .unwrap();

        assert!(path.starts_with("posts/"));
        assert!(path.ends_with(".gif"));
        let written = tokio::fs::read(root.join(&path)).await.unwrap();
        assert_eq!(written, b"GIF89a-payload");
        assert_eq!(store.url(&path), format!("/media/{path}"));

        store.delete(&path).await.unwrap();
        assert!(!root.join(&path).exists());
        assert!(store.delete(&path).await.is_err());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
