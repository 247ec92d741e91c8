//! Repair of stale file references in a loaded session.
//!
//! A session may point at files that were moved or deleted since it was
//! saved. Recovery first looks for a file with the same name under the
//! session's folders; if none turns up the entry is tombstoned: its path gets
//! [`MISSING_FILE_MARKER`] in front and its content is replaced by a short
//! explanation. Entries are never removed.

use super::model::WorkspaceSession;
use crate::files::FileSystem;
use crate::workspaces::{default_hidden_patterns, is_hidden};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix marking a session entry whose file could not be found.
pub const MISSING_FILE_MARKER: &str = "[missing] ";

/// Directory depth below a search root that basename search descends to.
pub const MAX_SEARCH_DEPTH: usize = 32;

/// Content shown in place of a file that could not be found.
pub fn missing_placeholder(path: &str) -> String {
    format!(
        "This file could not be found.\n\n\
         It was last opened from:\n    {}\n\n\
         It may have been moved, renamed or deleted. \
         Close this tab to remove it from the session.\n",
        path
    )
}

/// Outcome of [`FilePathRecovery::recover_file_paths`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// `(old path, new path)` for every relocated entry
    pub relocated: Vec<(String, PathBuf)>,
    /// Original paths of entries that were tombstoned
    pub missing: Vec<String>,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.relocated.is_empty() && self.missing.is_empty()
    }
}

/// Locates moved files through the file-system collaborator.
#[derive(Clone)]
pub struct FilePathRecovery {
    fs: Arc<dyn FileSystem>,
    hidden_patterns: Vec<String>,
}

impl FilePathRecovery {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            hidden_patterns: default_hidden_patterns(),
        }
    }

    pub async fn validate_path(&self, path: &Path) -> bool {
        self.fs.exists(path).await
    }

    /// First file named `basename` under `roots`.
    ///
    /// Roots are searched in order, each depth-first in listing order, so the
    /// result is deterministic. Hidden directories (`.git`, `node_modules`,
    /// ...) are not descended and unreadable directories are skipped.
    pub async fn find_by_basename(&self, basename: &str, roots: &[PathBuf]) -> Option<PathBuf> {
        for root in roots {
            if let Some(found) = self.search_root(basename, root).await {
                return Some(found);
            }
        }
        None
    }

    async fn search_root(&self, basename: &str, root: &Path) -> Option<PathBuf> {
        let entries = match self.fs.list_directory(root).await {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Skipping search root {}: {}", root.display(), err);
                return None;
            }
        };

        let mut stack = vec![(entries.into_iter(), 0usize)];
        loop {
            let Some((entries, depth)) = stack.last_mut() else {
                return None;
            };
            let depth = *depth;
            let Some(entry) = entries.next() else {
                stack.pop();
                continue;
            };

            if !entry.is_directory {
                if entry.name == basename {
                    return Some(entry.path);
                }
                continue;
            }
            if depth + 1 >= MAX_SEARCH_DEPTH || is_hidden(&entry.name, &self.hidden_patterns) {
                continue;
            }
            match self.fs.list_directory(&entry.path).await {
                Ok(children) => stack.push((children.into_iter(), depth + 1)),
                Err(err) => debug!("Skipping {}: {}", entry.path.display(), err),
            }
        }
    }

    /// Relocate or tombstone every entry whose file no longer exists.
    ///
    /// Untitled and already-tombstoned entries are left alone. Content of
    /// relocated entries is kept.
    pub async fn recover_file_paths(
        &self,
        mut session: WorkspaceSession,
    ) -> (WorkspaceSession, RecoveryReport) {
        let mut report = RecoveryReport::default();
        let roots = session.folder_paths.clone();

        for file in session.open_files.iter_mut() {
            if file.is_untitled() || file.is_missing() {
                continue;
            }
            let path = PathBuf::from(&file.file_path);
            if self.validate_path(&path).await {
                continue;
            }

            let found = match path.file_name().and_then(|n| n.to_str()) {
                Some(basename) => self.find_by_basename(basename, &roots).await,
                None => None,
            };
            match found {
                Some(new_path) => {
                    info!("Relocated {} to {}", file.file_path, new_path.display());
                    let old = std::mem::replace(
                        &mut file.file_path,
                        new_path.to_string_lossy().into_owned(),
                    );
                    report.relocated.push((old, new_path));
                }
                None => {
                    warn!("File not found, marking as missing: {}", file.file_path);
                    let original = std::mem::take(&mut file.file_path);
                    file.content = missing_placeholder(&original);
                    file.file_path = format!("{}{}", MISSING_FILE_MARKER, original);
                    file.is_modified = false;
                    report.missing.push(original);
                }
            }
        }

        (session, report)
    }

    /// Post-recovery pass. Tombstoned entries stay in the session so they
    /// remain visible as missing tabs.
    pub fn handle_missing_files(&self, session: WorkspaceSession) -> WorkspaceSession {
        let missing = session.missing_count();
        if missing > 0 {
            info!(
                "Session '{}' keeps {} missing file(s) as placeholders",
                session.name, missing
            );
        }
        session
    }
}
