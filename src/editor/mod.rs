//! Editor-state capture
//!
//! The text-editing surface is an external component. This module defines
//! the narrow contract the engine needs from it ([`EditorSurface`]) and the
//! per-tab view state snapshotted from it. The editor-native blob
//! ([`EditorViewState`]) is stored and handed back untouched; nothing in the
//! engine looks inside it.

mod capture;

pub use capture::{capture_tab, restore_tab};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Positions
// ─────────────────────────────────────────────────────────────────────────────

/// Zero-based cursor location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Scroll offsets in editor units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub top: f32,
    pub left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub start: CursorPosition,
    pub end: CursorPosition,
}

/// Serialized editor-native view state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorViewState(pub String);

/// Everything remembered about how a tab was being viewed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabViewState {
    pub cursor: CursorPosition,
    pub scroll: ScrollPosition,
    pub selections: Vec<Selection>,
    pub native: Option<EditorViewState>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor Surface
// ─────────────────────────────────────────────────────────────────────────────

/// The editing component bound to the active tab.
pub trait EditorSurface {
    fn get_value(&self) -> String;

    fn set_value(&mut self, text: &str);

    /// Editor-native view state, if the surface has one.
    fn get_view_state(&self) -> Option<EditorViewState>;

    fn restore_view_state(&mut self, state: &EditorViewState);

    fn get_cursor_position(&self) -> CursorPosition;

    fn get_scroll_position(&self) -> ScrollPosition;

    fn get_selections(&self) -> Vec<Selection> {
        Vec::new()
    }
}
