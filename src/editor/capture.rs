//! Snapshot and restore of a tab's editor state.

use super::{EditorSurface, TabViewState};
use crate::tabs::{TabId, TabManager};

/// Read the editing surface back into tab `id`.
///
/// Content goes through [`TabManager::update_content`], and the tab is marked
/// modified only when the text actually changed. Returns `false` for an
/// unknown tab.
pub fn capture_tab(tabs: &mut TabManager, id: TabId, surface: &dyn EditorSurface) -> bool {
    let text = surface.get_value();
    let changed = match tabs.get(id) {
        Some(tab) => tab.content != text,
        None => return false,
    };
    if changed {
        tabs.update_content(id, text);
        tabs.mark_modified(id, true);
    }

    tabs.set_view_state(
        id,
        TabViewState {
            cursor: surface.get_cursor_position(),
            scroll: surface.get_scroll_position(),
            selections: surface.get_selections(),
            native: surface.get_view_state(),
        },
    )
}

/// Load tab `id` into the editing surface, handing back its stored view
/// state unopened.
pub fn restore_tab(tabs: &TabManager, id: TabId, surface: &mut dyn EditorSurface) -> bool {
    let Some(tab) = tabs.get(id) else {
        return false;
    };
    surface.set_value(&tab.content);
    if let Some(native) = tabs.view_state(id).and_then(|s| s.native.as_ref()) {
        surface.restore_view_state(native);
    }
    true
}
