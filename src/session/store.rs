//! Key/value storage for session records.

use crate::error::{Error, Result};
use crate::files::write_atomic;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage slot a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Primary,
    Backup,
}

impl Namespace {
    fn dir_name(self) -> &'static str {
        match self {
            Namespace::Primary => "sessions",
            Namespace::Backup => "backups",
        }
    }
}

/// Durable storage of serialized session records, keyed by session id.
pub trait SessionStore: Send {
    /// Read a record. A missing record is `Ok(None)`.
    fn read(&self, namespace: Namespace, id: &str) -> Result<Option<String>>;

    /// Write (or overwrite) a record.
    fn write(&mut self, namespace: Namespace, id: &str, record: &str) -> Result<()>;

    /// Remove a record. Returns whether it existed.
    fn remove(&mut self, namespace: Namespace, id: &str) -> Result<bool>;

    /// Ids stored in `namespace`, sorted.
    fn list(&self, namespace: Namespace) -> Result<Vec<String>>;
}

/// Reject ids that could escape the store directory.
fn check_id(id: &str) -> Result<()> {
    let invalid = id.trim().is_empty()
        || id.starts_with('.')
        || id.contains(['/', '\\', ':'])
        || id.chars().any(char::is_control);
    if invalid {
        Err(Error::InvalidSessionId(id.to_string()))
    } else {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON Files
// ─────────────────────────────────────────────────────────────────────────────

/// One JSON file per record: `<root>/sessions/<id>.json` and
/// `<root>/backups/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, namespace: Namespace, id: &str) -> Result<PathBuf> {
        check_id(id)?;
        Ok(self
            .root
            .join(namespace.dir_name())
            .join(format!("{}.json", id)))
    }

    fn store_error(path: &Path, source: io::Error) -> Error {
        Error::SessionStore {
            key: path.display().to_string(),
            source,
        }
    }
}

impl SessionStore for JsonFileStore {
    fn read(&self, namespace: Namespace, id: &str) -> Result<Option<String>> {
        let path = self.record_path(namespace, id)?;
        match fs::read_to_string(&path) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::store_error(&path, err)),
        }
    }

    fn write(&mut self, namespace: Namespace, id: &str, record: &str) -> Result<()> {
        let path = self.record_path(namespace, id)?;
        write_atomic(&path, record).map_err(|e| Self::store_error(&path, e))?;
        debug!("Wrote session record {}", path.display());
        Ok(())
    }

    fn remove(&mut self, namespace: Namespace, id: &str) -> Result<bool> {
        let path = self.record_path(namespace, id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Self::store_error(&path, err)),
        }
    }

    fn list(&self, namespace: Namespace) -> Result<Vec<String>> {
        let dir = self.root.join(namespace.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::store_error(&dir, err)),
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-Memory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryInner {
    records: HashMap<(Namespace, String), String>,
    writes: usize,
}

/// Process-local store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Store a raw record without going through validation.
    pub fn put_raw(&self, namespace: Namespace, id: &str, record: &str) {
        self.inner
            .lock()
            .records
            .insert((namespace, id.to_string()), record.to_string());
    }

    pub fn get_raw(&self, namespace: Namespace, id: &str) -> Option<String> {
        self.inner
            .lock()
            .records
            .get(&(namespace, id.to_string()))
            .cloned()
    }
}

impl SessionStore for MemoryStore {
    fn read(&self, namespace: Namespace, id: &str) -> Result<Option<String>> {
        check_id(id)?;
        Ok(self.get_raw(namespace, id))
    }

    fn write(&mut self, namespace: Namespace, id: &str, record: &str) -> Result<()> {
        check_id(id)?;
        let mut inner = self.inner.lock();
        inner
            .records
            .insert((namespace, id.to_string()), record.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, namespace: Namespace, id: &str) -> Result<bool> {
        check_id(id)?;
        Ok(self
            .inner
            .lock()
            .records
            .remove(&(namespace, id.to_string()))
            .is_some())
    }

    fn list(&self, namespace: Namespace) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .inner
            .lock()
            .records
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_store_namespaces_are_separate() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());

        store.write(Namespace::Primary, "abc", "{\"p\":1}").unwrap();
        store.write(Namespace::Backup, "abc", "{\"b\":1}").unwrap();

        assert_eq!(
            store.read(Namespace::Primary, "abc").unwrap().as_deref(),
            Some("{\"p\":1}")
        );
        assert_eq!(
            store.read(Namespace::Backup, "abc").unwrap().as_deref(),
            Some("{\"b\":1}")
        );
        assert!(temp_dir.path().join("sessions").join("abc.json").exists());
        assert!(temp_dir.path().join("backups").join("abc.json").exists());
    }

    #[test]
    fn test_json_store_missing_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());

        assert!(store.read(Namespace::Primary, "nope").unwrap().is_none());
        assert!(!store.remove(Namespace::Primary, "nope").unwrap());
        assert!(store.list(Namespace::Primary).unwrap().is_empty());
    }

    #[test]
    fn test_json_store_list_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());
        store.write(Namespace::Primary, "b", "{}").unwrap();
        store.write(Namespace::Primary, "a", "{}").unwrap();
        fs::write(temp_dir.path().join("sessions").join("notes.txt"), "x").unwrap();

        assert_eq!(store.list(Namespace::Primary).unwrap(), vec!["a", "b"]);

        assert!(store.remove(Namespace::Primary, "a").unwrap());
        assert_eq!(store.list(Namespace::Primary).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path());

        for id in ["", "../escape", "a/b", "a\\b", ".hidden"] {
            assert!(matches!(
                store.write(Namespace::Primary, id, "{}"),
                Err(Error::InvalidSessionId(_))
            ));
        }
    }

    #[test]
    fn test_memory_store_clones_share_records() {
        let store = MemoryStore::new();
        let mut handle: Box<dyn SessionStore> = Box::new(store.clone());

        handle.write(Namespace::Primary, "s1", "{}").unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_raw(Namespace::Primary, "s1").as_deref(), Some("{}"));
        assert!(store.get_raw(Namespace::Backup, "s1").is_none());
    }
}
