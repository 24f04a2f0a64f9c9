//! Durable client-side storage for the session credential and identity.
//!
//! The browser build of LinkerX keeps these in `localStorage`; this crate
//! abstracts the same two named entries behind a small trait so hosts can
//! plug in whatever persistence they have. [`FileStorage`] covers desktop
//! and CLI hosts, [`MemoryStorage`] covers tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Entry name for the opaque session credential.
pub const TOKEN_ENTRY: &str = "auth_token";

/// Entry name for the serialized identity record.
pub const IDENTITY_ENTRY: &str = "user";

/// Boxed error for storage implementations.
pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// Host-provided durable key-value storage.
///
/// Entries are small strings written and removed together by the session
/// store; implementations do not need atomicity across entries.
pub trait Storage {
    /// Read an entry. A missing entry is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write an entry, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove an entry. Removing a missing entry succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one file per entry under a caller-chosen directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.entry_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.entry_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory storage for tests and hosts that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().expect("storage lock").get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("storage lock")
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().expect("storage lock").remove(key);
        Ok(())
    }
}
