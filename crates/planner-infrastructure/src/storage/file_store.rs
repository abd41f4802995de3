//! File-backed durable key-value storage.
//!
//! The whole store is a single JSON object of string values. Every mutation
//! is a locked read-modify-write that replaces the file atomically.

use planner_core::storage::{KeyValueStore, StorageError};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

type Entries = BTreeMap<String, String>;

/// A durable key-value store persisted as JSON.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: An exclusive lock file serializes writers across processes
/// - **Durability**: Explicit fsync before rename
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// The file and its parent directory are created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all entries.
    ///
    /// A missing or empty file is an empty store.
    fn load(&self) -> Result<Entries, StorageError> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Writes all entries atomically.
    fn save(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        restrict_permissions(&tmp_file)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Locked read-modify-write.
    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Entries),
    {
        let _lock = FileLock::acquire(&self.path)?;

        // A corrupt file is replaced by the next write rather than blocking it.
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(
                    "[FileKeyValueStore] {} is corrupt ({}); rewriting it",
                    self.path.display(),
                    e
                );
                Entries::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut entries);
        self.save(&entries)
    }

    fn temp_path(&self) -> Result<PathBuf, StorageError> {
        let invalid = |what: &str| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Path has no {}", what),
            ))
        };

        let parent = self.path.parent().ok_or_else(|| invalid("parent directory"))?;
        let file_name = self.path.file_name().ok_or_else(|| invalid("file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }

        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> std::io::Result<()> {
    Ok(())
}

/// A file lock guard that releases the lock when dropped.
///
/// The lock file is never removed: every writer must lock the same inode.
struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StorageError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| StorageError::Lock(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file })
    }
}
