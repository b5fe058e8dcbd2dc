//! Durable storage for the encrypted blob.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fs2::FileExt;

use crate::error::{VaultError, VaultResult};

/// Computes the replacement blob from the current one
pub type BlobUpdate<'a> = dyn FnMut(Option<String>) -> VaultResult<String> + 'a;

/// Key-value storage of opaque blobs
pub trait BlobStore: Send + Sync {
    /// The blob stored under `key`, if any
    fn load(&self, key: &str) -> VaultResult<Option<String>>;

    /// Replace the blob stored under `key`
    fn store(&self, key: &str, blob: &str) -> VaultResult<()>;

    /// Read, recompute and replace the blob under `key` while holding
    /// exclusive access to it.
    ///
    /// No other `store` or `update` of the same key runs in between. If
    /// `change` fails, nothing is written.
    fn update(&self, key: &str, change: &mut BlobUpdate<'_>) -> VaultResult<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn load(&self, key: &str) -> VaultResult<Option<String>> {
        (**self).load(key)
    }

    fn store(&self, key: &str, blob: &str) -> VaultResult<()> {
        (**self).store(key, blob)
    }

    fn update(&self, key: &str, change: &mut BlobUpdate<'_>) -> VaultResult<()> {
        (**self).update(key, change)
    }
}

/// Process-local store, mostly for tests and embedding hosts that persist
/// the blob themselves
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryBlobStore {
    fn blobs(&self) -> VaultResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| VaultError::internal("Blob store lock poisoned"))
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.blobs()?.get(key).cloned())
    }

    fn store(&self, key: &str, blob: &str) -> VaultResult<()> {
        self.blobs()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn update(&self, key: &str, change: &mut BlobUpdate<'_>) -> VaultResult<()> {
        let mut blobs = self.blobs()?;
        let updated = change(blobs.get(key).cloned())?;
        blobs.insert(key.to_string(), updated);
        Ok(())
    }
}

/// One JSON file per storage key inside a directory.
///
/// Writes go to a temporary file that is renamed over the old blob, so a
/// failed write leaves the previous blob intact. Writers serialize on an
/// advisory lock file (`.{key}.lock`), which also holds across processes.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> VaultResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(VaultError::invalid_input(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Run `f` while holding the exclusive lock for `key`
    fn with_exclusive<T>(&self, key: &str, f: impl FnOnce(&Path) -> VaultResult<T>) -> VaultResult<T> {
        let path = self.path_for(key)?;
        let lock_err =
            |e: std::io::Error| VaultError::storage_error("Failed to lock key store").with_details(e.to_string());

        fs::create_dir_all(&self.dir).map_err(lock_err)?;
        let lock = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(format!(".{}.lock", key)))
            .map_err(lock_err)?;
        FileExt::lock_exclusive(&lock).map_err(lock_err)?;

        let result = f(&path);
        let _ = FileExt::unlock(&lock);
        result
    }

    fn read_blob(path: &Path) -> VaultResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::storage_error("Failed to read key store").with_details(e.to_string())),
        }
    }

    fn write_blob(&self, key: &str, path: &Path, blob: &str) -> VaultResult<()> {
        let tmp = self.dir.join(format!(".{}.json.tmp", key));

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            VaultError::storage_error("Failed to write key store").with_details(e.to_string())
        })
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> VaultResult<Option<String>> {
        Self::read_blob(&self.path_for(key)?)
    }

    fn store(&self, key: &str, blob: &str) -> VaultResult<()> {
        self.with_exclusive(key, |path| self.write_blob(key, path, blob))
    }

    fn update(&self, key: &str, change: &mut BlobUpdate<'_>) -> VaultResult<()> {
        self.with_exclusive(key, |path| {
            let updated = change(Self::read_blob(path)?)?;
            self.write_blob(key, path, &updated)
        })
    }
}
