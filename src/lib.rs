//! Ferrite session engine
//!
//! The state behind Ferrite's editor window: open tabs, the workspace folder
//! and its file tree, and workspace sessions that survive restarts, moved
//! files and older on-disk formats. The UI layer drives everything through
//! [`AppState`].

pub mod actions;
pub mod concurrency;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod files;
pub mod session;
pub mod state;
pub mod tabs;
pub mod workspaces;

pub use error::{Error, Result};
pub use state::{AppState, UiState};
