//! Blob storage
//!
//! Durable, URL-addressable storage for uploaded sources and generated
//! artifacts. Objects are addressed by slash-separated keys such as
//! `{owner}/{timestamp}_{name}.pdf`.

mod filesystem;
pub mod keys;

pub use filesystem::FilesystemBlobStore;

use async_trait::async_trait;

/// Errors that can occur during blob storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The key is empty, absolute or escapes the store
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// An object is already stored under the key
    #[error("blob already exists: {0}")]
    AlreadyExists(String),

    /// An I/O error occurred
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored object and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size: u64,
}

/// Key-addressed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a new `key`.
    ///
    /// Never replaces an existing object; fails with
    /// [`StorageError::AlreadyExists`] instead.
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL of the object under `key`
    fn url(&self, key: &str) -> String;
}
