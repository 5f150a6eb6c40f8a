//! Persistence backends for the session collection
//!
//! The collection is always stored whole: every mutation is a
//! read-modify-write of the full history.

use super::store::SessionCollection;
use fs2::FileExt;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key the session collection is stored under
pub const DEFAULT_STORAGE_KEY: &str = "allChatSessions";

/// File name of the key-value store inside the storage directory
pub const STORAGE_FILE: &str = "local_storage.json";

/// Where the session collection lives
///
/// `load` never fails: absent or unreadable data is an empty collection.
pub trait SessionStorage: Send + Sync {
    /// Read the full collection
    fn load(&self) -> SessionCollection;

    /// Replace the stored collection
    fn save(&self, sessions: &SessionCollection) -> crate::Result<()>;

    /// Load, apply `mutate`, and save back.
    ///
    /// Backends shared between processes override this to hold a lock for
    /// the whole cycle.
    fn update(&self, mutate: &mut dyn FnMut(&mut SessionCollection)) -> crate::Result<()> {
        let mut sessions = self.load();
        mutate(&mut sessions);
        self.save(&sessions)
    }
}

/// Decode a stored collection, treating `null` and malformed data as empty
fn decode_collection(value: Value) -> SessionCollection {
    if value.is_null() {
        return SessionCollection::new();
    }
    match serde_json::from_value::<SessionCollection>(value) {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!("Stored session history is malformed, starting empty: {}", e);
            SessionCollection::new()
        }
    }
}

fn decode_collection_str(raw: &str) -> SessionCollection {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode_collection(value),
        Err(e) => {
            warn!("Stored session history is not valid JSON, starting empty: {}", e);
            SessionCollection::new()
        }
    }
}

/// In-process storage holding the serialized collection as text
#[derive(Debug, Default)]
pub struct MemoryStorage {
    raw: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with arbitrary stored text, valid or not
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    /// The stored text, exactly as the last save wrote it
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> SessionCollection {
        match self.raw.lock().as_deref() {
            Some(raw) => decode_collection_str(raw),
            None => SessionCollection::new(),
        }
    }

    fn save(&self, sessions: &SessionCollection) -> crate::Result<()> {
        let encoded = serde_json::to_string(sessions)?;
        *self.raw.lock() = Some(encoded);
        Ok(())
    }

    fn update(&self, mutate: &mut dyn FnMut(&mut SessionCollection)) -> crate::Result<()> {
        let mut guard = self.raw.lock();
        let mut sessions = match guard.as_deref() {
            Some(raw) => decode_collection_str(raw),
            None => SessionCollection::new(),
        };
        mutate(&mut sessions);
        *guard = Some(serde_json::to_string(&sessions)?);
        Ok(())
    }
}

/// A JSON key-value file in the style of browser local storage
///
/// The session collection is one entry of the file; any other entries are
/// kept as they are on every write.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    key: String,
}

impl LocalStorage {
    /// Open the store file inside `dir`, using `key` for the collection
    pub fn new<P: AsRef<Path>>(dir: P, key: impl Into<String>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
            key: key.into(),
        }
    }

    /// Open the store file inside `dir` under the default key
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir, DEFAULT_STORAGE_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read a raw entry from the store file
    pub fn get_item(&self, key: &str) -> Option<Value> {
        self.read_entries().remove(key)
    }

    /// Write a raw entry, keeping every other entry
    pub fn set_item(&self, key: &str, value: Value) -> crate::Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value);
        self.write_entries(&entries)
    }

    fn read_entries(&self) -> Map<String, Value> {
        if !self.path.exists() {
            return Map::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };
        if content.trim().is_empty() {
            return Map::new();
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("{} is not a JSON object, ignoring it", self.path.display());
                Map::new()
            }
            Err(e) => {
                warn!("{} is not valid JSON, ignoring it: {}", self.path.display(), e);
                Map::new()
            }
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                crate::Error::Storage(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
            drop(tmp);
            fs::rename(&tmp_path, &self.path)
        };
        write().map_err(|e| {
            crate::Error::Storage(format!("Failed to write '{}': {}", self.path.display(), e))
        })?;

        debug!("Wrote {}", self.path.display());
        Ok(())
    }

    fn load_unlocked(&self) -> SessionCollection {
        self.read_entries()
            .remove(&self.key)
            .map(decode_collection)
            .unwrap_or_default()
    }

    fn save_unlocked(&self, sessions: &SessionCollection) -> crate::Result<()> {
        let mut entries = self.read_entries();
        entries.insert(self.key.clone(), serde_json::to_value(sessions)?);
        self.write_entries(&entries)
    }
}

impl SessionStorage for LocalStorage {
    fn load(&self) -> SessionCollection {
        self.load_unlocked()
    }

    fn save(&self, sessions: &SessionCollection) -> crate::Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        self.save_unlocked(sessions)
    }

    fn update(&self, mutate: &mut dyn FnMut(&mut SessionCollection)) -> crate::Result<()> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut sessions = self.load_unlocked();
        mutate(&mut sessions);
        self.save_unlocked(&sessions)
    }
}

/// Exclusive lock on a sidecar `.lock` file, released on drop
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> crate::Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        file.lock_exclusive().map_err(|e| {
            crate::Error::Storage(format!(
                "Failed to lock '{}': {}",
                lock_path.display(),
                e
            ))
        })?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
