use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::keys::validate_key;
use super::{BlobStore, StorageError, StoredObject};

/// Filesystem-backed blob store.
///
/// Objects live at `{base_path}/{key}` and are served over HTTP under
/// `{public_base}/{key}`. Writes go to a temp file first and are linked
/// into place, so readers never see a partial object and an existing object
/// is never replaced.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base: String,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    ///
    /// # Arguments
    /// * `base_path` - Root directory of the store (created if missing)
    /// * `public_base` - URL prefix the root is served under
    pub async fn new(
        base_path: PathBuf,
        public_base: impl Into<String>,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject, StorageError> {
        let object_path = self.object_path(key)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }

        // Hard link publishes the object without clobbering a concurrent writer
        let linked = fs::hard_link(&temp_path, &object_path).await;
        let _ = fs::remove_file(&temp_path).await;
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(StoredObject {
            key: key.to_string(),
            url: self.url(key),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let object_path = self.object_path(key)?;
        match fs::remove_file(&object_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FilesystemBlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("blobs"), "http://localhost:5000/files/")
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_writes_object_and_returns_url() {
        let (store, _dir) = temp_store().await;
        let object = store.put("owner/1_paper.pdf", b"%PDF-1.7").await.unwrap();

        assert_eq!(object.size, 8);
        assert_eq!(object.url, "http://localhost:5000/files/owner/1_paper.pdf");
        let on_disk = std::fs::read(store.base_path().join("owner/1_paper.pdf")).unwrap();
        assert_eq!(on_disk, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files() {
        let (store, _dir) = temp_store().await;
        store.put("owner/a.pdf", b"a").await.unwrap();

        let tmp_entries: Vec<_> = std::fs::read_dir(store.base_path().join(".tmp"))
            .unwrap()
            .collect();
        assert_eq!(tmp_entries.len(), 0);
    }

    #[tokio::test]
    async fn put_refuses_to_overwrite() {
        let (store, _dir) = temp_store().await;
        store.put("owner/podcast_1.mp3", b"first").await.unwrap();

        let err = store.put("owner/podcast_1.mp3", b"second").await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(ref key) if key == "owner/podcast_1.mp3"));

        let on_disk = std::fs::read(store.base_path().join("owner/podcast_1.mp3")).unwrap();
        assert_eq!(on_disk, b"first");
        let tmp_entries = std::fs::read_dir(store.base_path().join(".tmp")).unwrap().count();
        assert_eq!(tmp_entries, 0);
    }

    #[tokio::test]
    async fn concurrent_puts_to_one_key_have_a_single_winner() {
        let (store, _dir) = temp_store().await;
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.put("owner/same.mp3", &[i]).await }));
        }
        let mut stored = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => stored += 1,
                Err(StorageError::AlreadyExists(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let (store, _dir) = temp_store().await;
        store.put("owner/x.pdf", b"x").await.unwrap();

        assert!(store.delete("owner/x.pdf").await.unwrap());
        assert!(!store.base_path().join("owner/x.pdf").exists());
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_false() {
        let (store, _dir) = temp_store().await;
        assert!(!store.delete("owner/never.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (store, _dir) = temp_store().await;
        assert!(matches!(
            store.put("../escape.pdf", b"x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.delete("/etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn constructor_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("deep/nested/blobs");
        assert!(!base.exists());

        let _store = FilesystemBlobStore::new(base.clone(), "http://x/files").await.unwrap();

        assert!(base.exists());
        assert!(base.join(".tmp").exists());
    }
}
