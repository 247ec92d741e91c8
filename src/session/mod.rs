//! Workspace sessions
//!
//! This module provides everything between the live tab set and disk:
//! - Session records and snapshots of live state
//! - Storage backends (JSON files, in-memory)
//! - Schema migration of older records
//! - Validated save/load with a single backup slot per session
//! - Recovery of moved or deleted files
//! - The periodic auto-save timer
//! - The orchestrator owning the current session

mod autosave;
mod migration;
mod model;
mod orchestrator;
mod persistence;
mod recovery;
mod store;

pub use autosave::AutoSaveTimer;
pub use migration::{migrate, schema_version, CURRENT_SCHEMA_VERSION};
pub use model::{OpenFileState, SessionSummary, WorkspaceSession};
pub use orchestrator::{LoadOutcome, SessionManager};
pub use persistence::PersistenceService;
pub use recovery::{
    missing_placeholder, FilePathRecovery, RecoveryReport, MAX_SEARCH_DEPTH, MISSING_FILE_MARKER,
};
pub use store::{JsonFileStore, MemoryStore, Namespace, SessionStore};
