//! In-memory file system used by the test suites.
//!
//! Listings keep insertion order so tests can pin down "first match in
//! listing order" behavior, and per-directory delays let tests force one
//! listing to resolve after another.

use super::fs::{DirEntry, FileSystem};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    files: HashMap<PathBuf, Vec<u8>>,
    listings: HashMap<PathBuf, Vec<DirEntry>>,
    selections: VecDeque<Option<PathBuf>>,
    delays: HashMap<PathBuf, Duration>,
    failures: HashMap<PathBuf, String>,
    writes: Vec<PathBuf>,
}

#[derive(Default)]
pub struct MemoryFileSystem {
    inner: Mutex<Inner>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (and any missing ancestor directories).
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl AsRef<[u8]>) {
        let path = path.into();
        let mut inner = self.inner.lock();
        Self::link(&mut inner, &path, false);
        inner.files.insert(path, content.as_ref().to_vec());
    }

    /// Add an empty directory (and any missing ancestors).
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut inner = self.inner.lock();
        Self::link(&mut inner, &path, true);
        inner.listings.entry(path).or_default();
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut inner = self.inner.lock();
        inner.files.remove(path);
        if let Some(parent) = path.parent() {
            if let Some(listing) = inner.listings.get_mut(parent) {
                listing.retain(|e| e.path != path);
            }
        }
    }

    /// Queue the answer for the next `select_folder` call.
    pub fn queue_selection(&self, folder: Option<PathBuf>) {
        self.inner.lock().selections.push_back(folder);
    }

    /// Make listing `dir` take `delay` before resolving.
    pub fn set_list_delay(&self, dir: impl Into<PathBuf>, delay: Duration) {
        self.inner.lock().delays.insert(dir.into(), delay);
    }

    /// Make listing `dir` fail with `message`.
    pub fn fail_listing(&self, dir: impl Into<PathBuf>, message: &str) {
        self.inner
            .lock()
            .failures
            .insert(dir.into(), message.to_string());
    }

    /// Paths written through `write_text_file`, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.inner.lock().writes.clone()
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner
            .lock()
            .files
            .get(path.as_ref())
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    fn link(inner: &mut Inner, path: &Path, is_directory: bool) {
        let mut child = path.to_path_buf();
        let mut child_is_dir = is_directory;
        while let Some(parent) = child.parent().map(Path::to_path_buf) {
            if parent.as_os_str().is_empty() {
                break;
            }
            let listing = inner.listings.entry(parent.clone()).or_default();
            if !listing.iter().any(|e| e.path == child) {
                listing.push(if child_is_dir {
                    DirEntry::directory(child.clone())
                } else {
                    DirEntry::file(child.clone())
                });
            }
            child = parent;
            child_is_dir = true;
        }
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn select_folder(&self) -> Option<PathBuf> {
        self.inner.lock().selections.pop_front().flatten()
    }

    async fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let delay = self.inner.lock().delays.get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock();
        if let Some(message) = inner.failures.get(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, message.clone()));
        }
        inner
            .listings
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn read_text_file(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_binary_file(path).await?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    async fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    async fn write_text_file(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut inner = self.inner.lock();
        Self::link(&mut inner, path, false);
        inner.files.insert(path.to_path_buf(), content.as_bytes().to_vec());
        inner.writes.push(path.to_path_buf());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.lock();
        inner.files.contains_key(path) || inner.listings.contains_key(path)
    }
}
