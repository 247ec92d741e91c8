//! File operations module
//!
//! This module provides the file-system collaborator used by the engine
//! (folder picking, listing, reading and writing), text/binary sniffing,
//! and small helpers shared by the persistence layers.

mod classify;
mod fs;
mod local;
#[cfg(test)]
pub(crate) mod memory;

pub use classify::{classify, decode_text, Encoding, FileClassification};
pub use fs::{DirEntry, FileSystem};
pub use local::LocalFileSystem;

use std::io;
use std::path::Path;

/// Units used by [`format_file_size`], 1024 apart.
const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary (1024-based) units and one decimal.
///
/// `0` → `"0.0 B"`, `1024` → `"1.0 KB"`, `1048576` → `"1.0 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// Write `contents` to `path` atomically.
///
/// The data is written to a sibling `.tmp` file which then replaces the
/// target, so readers never observe a half-written file. Missing parent
/// directories are created.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)
}
