//! Tab management
//!
//! Tab lifecycle for the open document set: creation, closing (with the
//! active-tab fallback rule), activation, ordering, pinning, content
//! tracking and named groups.

mod groups;
mod manager;
mod tab;

pub use groups::{TabGroup, TabGroupId};
pub use manager::TabManager;
pub use tab::{title_for, Language, Tab, TabId, TabSpec, UNTITLED};
