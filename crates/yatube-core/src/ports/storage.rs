//! Media storage port.

use async_trait::async_trait;

use crate::validation::DecodedImage;

/// Storage for uploaded post images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the image and return its path relative to the media root.
    async fn save(&self, image: DecodedImage) -> Result<String, StorageError>;

    /// Remove a previously saved image.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Public URL for a stored path.
    fn url(&self, path: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),
}
