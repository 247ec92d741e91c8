//! Local disk implementation of the file-system collaborator.

use super::fs::{DirEntry, FileSystem};
use async_trait::async_trait;
use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};

/// [`FileSystem`] backed by `tokio::fs` and the native folder picker.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    /// Directory the folder picker starts in
    initial_dir: Option<PathBuf>,
}

impl LocalFileSystem {
    pub fn new() -> Self {
        Self { initial_dir: None }
    }

    /// Start the folder picker in `dir` (e.g. the most recent workspace).
    pub fn with_initial_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.initial_dir = dir;
        self
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn select_folder(&self) -> Option<PathBuf> {
        let initial_dir = self.initial_dir.clone();
        // The native dialog blocks its thread until the user answers
        let picked = tokio::task::spawn_blocking(move || {
            let mut dialog = rfd::FileDialog::new().set_title("Open Workspace Folder");
            if let Some(dir) = initial_dir {
                dialog = dialog.set_directory(dir);
            }
            dialog.pick_folder()
        })
        .await;

        match picked {
            Ok(folder) => folder,
            Err(e) => {
                warn!("Folder picker task failed: {}", e);
                None
            }
        }
    }

    async fn list_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut read_dir = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(n) => n,
                Err(_) => continue, // Skip entries with invalid UTF-8 names
            };
            let is_directory = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name,
                path: entry.path(),
                is_directory,
            });
        }

        debug!("Listed {} entries in {}", entries.len(), path.display());
        Ok(entries)
    }

    async fn read_text_file(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn read_binary_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_text_file(&self, path: &Path, content: &str) -> io::Result<()> {
        tokio::fs::write(path, content).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_roundtrip_and_listing() {
        let temp_dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let file = temp_dir.path().join("notes.md");
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();

        fs.write_text_file(&file, "# Notes").await.unwrap();
        assert!(fs.exists(&file).await);
        assert_eq!(fs.read_text_file(&file).await.unwrap(), "# Notes");
        assert_eq!(fs.read_binary_file(&file).await.unwrap(), b"# Notes");

        let mut entries = fs.list_directory(temp_dir.path()).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "notes.md");
        assert!(!entries[0].is_directory);
        assert_eq!(entries[1].name, "sub");
        assert!(entries[1].is_directory);
    }

    #[tokio::test]
    async fn test_local_missing_paths() {
        let temp_dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new();
        let missing = temp_dir.path().join("gone.md");

        assert!(!fs.exists(&missing).await);
        assert!(fs.read_text_file(&missing).await.is_err());
        assert!(fs.list_directory(&missing).await.is_err());
    }
}
