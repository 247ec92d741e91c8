//! Workspace folder explorer
//!
//! This module provides folder/workspace support including:
//! - Opening a folder (picker → listing → commit) under last-request-wins
//! - The lazily loaded file tree of the open folder
//! - Hidden-file filtering shared with file-path recovery

mod file_tree;

pub use file_tree::{
    build_children, default_hidden_patterns, is_hidden, FileTreeNode, FileTreeNodeKind,
    DEFAULT_HIDDEN_PATTERNS,
};

use crate::concurrency::{ConcurrencyGuard, Operation, OperationClass};
use crate::error::{Error, Result};
use crate::files::FileSystem;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Stage label for folder listing failures.
pub const FILE_TREE_STAGE: &str = "Failed to load file tree";

/// How a folder-open request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// The folder is now the workspace root
    Opened(PathBuf),
    /// The user dismissed the folder picker
    Dismissed,
    /// A newer folder-open started; this result was dropped
    Superseded,
}

#[derive(Debug, Default)]
struct Explorer {
    root: Option<PathBuf>,
    tree: Option<FileTreeNode>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace
// ─────────────────────────────────────────────────────────────────────────────

/// The open folder and its file tree.
///
/// All methods take `&self`; state is only committed by the latest
/// folder-open, so overlapping requests cannot leave a mix of two folders.
pub struct Workspace {
    fs: Arc<dyn FileSystem>,
    guard: ConcurrencyGuard,
    hidden_patterns: Vec<String>,
    state: Mutex<Explorer>,
}

impl Workspace {
    pub fn new(fs: Arc<dyn FileSystem>, guard: ConcurrencyGuard) -> Self {
        Self {
            fs,
            guard,
            hidden_patterns: default_hidden_patterns(),
            state: Mutex::new(Explorer::default()),
        }
    }

    pub fn current_folder(&self) -> Option<PathBuf> {
        self.state.lock().root.clone()
    }

    pub fn file_tree(&self) -> Option<FileTreeNode> {
        self.state.lock().tree.clone()
    }

    /// Whether a folder-open is still running.
    pub fn is_loading(&self) -> bool {
        self.guard.is_in_flight(OperationClass::OpenFolder)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask for a folder, list it and make it the workspace root.
    pub async fn open_folder(&self) -> Result<FolderOutcome> {
        let operation = self.guard.begin(OperationClass::OpenFolder);
        let Some(folder) = self.fs.select_folder().await else {
            debug!("Folder picker dismissed");
            return Ok(FolderOutcome::Dismissed);
        };
        if !operation.is_current() {
            return Ok(FolderOutcome::Superseded);
        }
        self.load_folder(&operation, folder).await
    }

    /// List `folder` and make it the workspace root, skipping the picker.
    pub async fn open_folder_at(&self, folder: PathBuf) -> Result<FolderOutcome> {
        let operation = self.guard.begin(OperationClass::OpenFolder);
        self.load_folder(&operation, folder).await
    }

    async fn load_folder(&self, operation: &Operation, folder: PathBuf) -> Result<FolderOutcome> {
        let listing = self.fs.list_directory(&folder).await;
        let token = operation.token();

        match listing {
            Ok(entries) => {
                let tree = FileTreeNode::root(&folder, entries, &self.hidden_patterns);
                let committed = token.commit(|| {
                    let mut state = self.state.lock();
                    state.root = Some(folder.clone());
                    state.tree = Some(tree);
                });
                Ok(match committed {
                    Some(()) => {
                        info!("Opened workspace {}", folder.display());
                        FolderOutcome::Opened(folder)
                    }
                    None => FolderOutcome::Superseded,
                })
            }
            Err(err) if token.is_current() => {
                warn!("Could not list {}: {}", folder.display(), err);
                Err(Error::at_stage(FILE_TREE_STAGE, err))
            }
            Err(_) => Ok(FolderOutcome::Superseded),
        }
    }

    /// Forget the open folder. Any folder-open still running is cancelled.
    pub fn close_folder(&self) {
        self.guard.cancel(OperationClass::OpenFolder);
        let mut state = self.state.lock();
        state.root = None;
        state.tree = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tree
    // ─────────────────────────────────────────────────────────────────────────

    /// List a directory of the tree and expand it.
    ///
    /// Returns `Ok(false)` if the directory is not in the tree, or if the
    /// folder changed while listing.
    pub async fn expand_directory(&self, path: &Path) -> Result<bool> {
        let tree_token = self.guard.snapshot(OperationClass::OpenFolder);
        let is_unloaded_dir = {
            let state = self.state.lock();
            match state.tree.as_ref().and_then(|t| t.find(path)) {
                Some(node) if node.is_directory() => !node.is_loaded(),
                _ => return Ok(false),
            }
        };

        if !is_unloaded_dir {
            return Ok(self.set_expanded(path, true));
        }

        let listing = self.fs.list_directory(path).await;
        match listing {
            Ok(entries) => {
                let expanded = tree_token.commit(|| {
                    let mut state = self.state.lock();
                    match state.tree.as_mut().and_then(|t| t.find_mut(path)) {
                        Some(node) => {
                            node.set_children(entries, &self.hidden_patterns);
                            node.is_expanded = true;
                            true
                        }
                        None => false,
                    }
                });
                Ok(expanded.unwrap_or(false))
            }
            Err(err) if tree_token.is_current() => Err(Error::at_stage(FILE_TREE_STAGE, err)),
            Err(_) => Ok(false),
        }
    }

    /// Collapse a directory; its children stay loaded.
    pub fn collapse_directory(&self, path: &Path) -> bool {
        self.set_expanded(path, false)
    }

    fn set_expanded(&self, path: &Path, expanded: bool) -> bool {
        let mut state = self.state.lock();
        match state.tree.as_mut().and_then(|t| t.find_mut(path)) {
            Some(node) if node.is_directory() => {
                node.is_expanded = expanded;
                true
            }
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
