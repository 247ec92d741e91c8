//! File tree data structures built from directory listings.

use crate::files::DirEntry;
use std::path::{Path, PathBuf};

/// Default patterns that are always hidden unless explicitly shown.
pub const DEFAULT_HIDDEN_PATTERNS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "target",
    ".idea",
    ".vscode",
    "__pycache__",
    ".DS_Store",
    "Thumbs.db",
];

pub fn default_hidden_patterns() -> Vec<String> {
    DEFAULT_HIDDEN_PATTERNS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// File Tree Node
// ─────────────────────────────────────────────────────────────────────────────

/// A node in the file tree representing a file or directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTreeNode {
    /// Display name of the file or folder
    pub name: String,

    /// Full path to this item
    pub path: PathBuf,

    /// Type of node (file or directory with children)
    pub kind: FileTreeNodeKind,

    /// Whether this node is expanded (for directories)
    pub is_expanded: bool,
}

/// The kind of file tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum FileTreeNodeKind {
    /// A regular file
    File,

    /// A directory; `children` is `None` until the directory is listed
    Directory { children: Option<Vec<FileTreeNode>> },
}

impl FileTreeNode {
    /// Create a new file node.
    pub fn file(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            kind: FileTreeNodeKind::File,
            is_expanded: false,
        }
    }

    /// Create a directory node whose children are not loaded yet.
    pub fn directory(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            kind: FileTreeNodeKind::Directory { children: None },
            is_expanded: false,
        }
    }

    pub fn from_entry(entry: DirEntry) -> Self {
        if entry.is_directory {
            Self::directory(entry.name, entry.path)
        } else {
            Self::file(entry.name, entry.path)
        }
    }

    /// The expanded root node of a freshly listed folder.
    pub fn root(path: &Path, entries: Vec<DirEntry>, hidden_patterns: &[String]) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("workspace")
            .to_string();
        let mut node = Self::directory(name, path.to_path_buf());
        node.set_children(entries, hidden_patterns);
        node.is_expanded = true;
        node
    }

    /// Check if this node is a directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, FileTreeNodeKind::Directory { .. })
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, FileTreeNodeKind::File)
    }

    /// Whether this directory has been listed.
    pub fn is_loaded(&self) -> bool {
        matches!(
            self.kind,
            FileTreeNodeKind::Directory {
                children: Some(_)
            }
        )
    }

    /// Get loaded children if this is a directory.
    pub fn children(&self) -> Option<&[FileTreeNode]> {
        match &self.kind {
            FileTreeNodeKind::Directory { children } => children.as_deref(),
            FileTreeNodeKind::File => None,
        }
    }

    /// Replace this directory's children with a listing. Returns `false`
    /// for file nodes.
    pub fn set_children(&mut self, entries: Vec<DirEntry>, hidden_patterns: &[String]) -> bool {
        match &mut self.kind {
            FileTreeNodeKind::Directory { children } => {
                *children = Some(build_children(entries, hidden_patterns));
                true
            }
            FileTreeNodeKind::File => false,
        }
    }

    /// Find a node by path.
    pub fn find(&self, target_path: &Path) -> Option<&FileTreeNode> {
        if self.path == target_path {
            return Some(self);
        }
        self.children()?
            .iter()
            .find_map(|child| child.find(target_path))
    }

    /// Find a mutable node by path.
    pub fn find_mut(&mut self, target_path: &Path) -> Option<&mut FileTreeNode> {
        if self.path == target_path {
            return Some(self);
        }

        if let FileTreeNodeKind::Directory {
            children: Some(children),
        } = &mut self.kind
        {
            for child in children {
                if let Some(found) = child.find_mut(target_path) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Count loaded files in this tree (recursive).
    pub fn file_count(&self) -> usize {
        match &self.kind {
            FileTreeNodeKind::File => 1,
            FileTreeNodeKind::Directory { children } => children
                .iter()
                .flatten()
                .map(|c| c.file_count())
                .sum(),
        }
    }

    /// Paths of every loaded file, in tree order.
    pub fn all_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        self.collect_files(&mut files);
        files
    }

    fn collect_files(&self, files: &mut Vec<PathBuf>) {
        match &self.kind {
            FileTreeNodeKind::File => files.push(self.path.clone()),
            FileTreeNodeKind::Directory { children } => {
                for child in children.iter().flatten() {
                    child.collect_files(files);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Turn a directory listing into sorted, filtered child nodes.
pub fn build_children(entries: Vec<DirEntry>, hidden_patterns: &[String]) -> Vec<FileTreeNode> {
    let mut nodes: Vec<FileTreeNode> = entries
        .into_iter()
        .filter(|entry| !is_hidden(&entry.name, hidden_patterns))
        .map(FileTreeNode::from_entry)
        .collect();

    // Sort: directories first, then alphabetically (case-insensitive)
    nodes.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    nodes
}

/// Whether an entry named `name` is left out of the tree.
///
/// Dot files are hidden except for a few commonly edited ones.
pub fn is_hidden(name: &str, patterns: &[String]) -> bool {
    (name.starts_with('.') && !is_allowed_dot_file(name)) || should_hide(name, patterns)
}

/// Check if a dot file should be shown (some are important).
fn is_allowed_dot_file(name: &str) -> bool {
    matches!(
        name,
        ".gitignore" | ".env" | ".env.example" | ".editorconfig" | ".prettierrc" | ".eslintrc"
    )
}

/// Check if a file/folder should be hidden based on patterns.
fn should_hide(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        // Exact match, or a simple `*.ext` wildcard
        pattern == name
            || pattern
                .strip_prefix('*')
                .is_some_and(|suffix| name.ends_with(suffix))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<DirEntry> {
        vec![
            DirEntry::file(PathBuf::from("/root/zeta.md")),
            DirEntry::directory(PathBuf::from("/root/src")),
            DirEntry::file(PathBuf::from("/root/Alpha.md")),
            DirEntry::directory(PathBuf::from("/root/node_modules")),
            DirEntry::file(PathBuf::from("/root/.secret")),
            DirEntry::file(PathBuf::from("/root/.gitignore")),
            DirEntry::file(PathBuf::from("/root/debug.log")),
        ]
    }

    #[test]
    fn test_root_is_sorted_and_filtered() {
        let mut patterns = default_hidden_patterns();
        patterns.push("*.log".to_string());

        let root = FileTreeNode::root(Path::new("/root"), entries(), &patterns);

        assert!(root.is_expanded);
        let names: Vec<&str> = root
            .children()
            .unwrap()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["src", ".gitignore", "Alpha.md", "zeta.md"]);
    }

    #[test]
    fn test_directories_start_unloaded() {
        let root = FileTreeNode::root(Path::new("/root"), entries(), &[]);
        let src = root.find(Path::new("/root/src")).unwrap();

        assert!(src.is_directory());
        assert!(!src.is_loaded());
        assert!(src.children().is_none());
    }

    #[test]
    fn test_set_children_on_nested_directory() {
        let mut root = FileTreeNode::root(Path::new("/root"), entries(), &[]);
        let src = root.find_mut(Path::new("/root/src")).unwrap();

        assert!(src.set_children(vec![DirEntry::file(PathBuf::from("/root/src/main.rs"))], &[]));
        src.is_expanded = true;

        assert!(root.find(Path::new("/root/src/main.rs")).is_some());
        assert!(root.find(Path::new("/root/src")).unwrap().is_expanded);
    }

    #[test]
    fn test_set_children_on_file_fails() {
        let mut node = FileTreeNode::file("a.md".to_string(), PathBuf::from("/a.md"));
        assert!(!node.set_children(Vec::new(), &[]));
    }

    #[test]
    fn test_should_hide() {
        let patterns = vec!["node_modules".to_string(), "*.log".to_string()];

        assert!(should_hide("node_modules", &patterns));
        assert!(should_hide("debug.log", &patterns));
        assert!(!should_hide("src", &patterns));
        assert!(!should_hide("main.rs", &patterns));
    }

    #[test]
    fn test_is_hidden_dot_files() {
        assert!(is_hidden(".cache", &[]));
        assert!(!is_hidden(".env", &[]));
        assert!(is_hidden(".git", &default_hidden_patterns()));
    }

    #[test]
    fn test_file_count_and_all_files() {
        let mut root = FileTreeNode::root(
            Path::new("/root"),
            vec![
                DirEntry::file(PathBuf::from("/root/a.txt")),
                DirEntry::directory(PathBuf::from("/root/sub")),
            ],
            &[],
        );
        root.find_mut(Path::new("/root/sub")).unwrap().set_children(
            vec![
                DirEntry::file(PathBuf::from("/root/sub/b.txt")),
                DirEntry::file(PathBuf::from("/root/sub/c.txt")),
            ],
            &[],
        );

        assert_eq!(root.file_count(), 3);
        assert_eq!(
            root.all_files(),
            vec![
                PathBuf::from("/root/sub/b.txt"),
                PathBuf::from("/root/sub/c.txt"),
                PathBuf::from("/root/a.txt"),
            ]
        );
    }
}
