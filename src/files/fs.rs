//! The file-system collaborator contract.
//!
//! Everything the engine needs from the disk goes through [`FileSystem`]:
//! folder picking, directory listing, reading and writing. The trait is
//! object safe so one implementation can be constructed at startup and
//! shared as `Arc<dyn FileSystem>`; tests swap in an in-memory fake.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or folder name (last path component)
    pub name: String,
    /// Full path to the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

impl DirEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), false)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), true)
    }

    fn new(path: PathBuf, is_directory: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            is_directory,
        }
    }
}

/// Async file-system access.
///
/// Every method is a suspension point; callers that mutate shared state after
/// awaiting one of these must re-check their cancellation token first.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Ask the user for a folder. `None` means the picker was dismissed.
    async fn select_folder(&self) -> Option<PathBuf>;

    /// List the immediate children of a directory, in the backend's order.
    async fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read a whole file as UTF-8 text.
    async fn read_text_file(&self, path: &Path) -> io::Result<String>;

    /// Read a whole file as raw bytes.
    async fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace a file's contents with `content`.
    async fn write_text_file(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;
}
