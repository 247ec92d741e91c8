//! The open tab set.
//!
//! [`TabManager`] owns the tabs, their display order and the active tab.
//! Every operation is a synchronous state transition and every operation on
//! an unknown id is a no-op that reports `false`.

use super::groups::{TabGroup, TabGroupId, TabGroups};
use super::tab::{Tab, TabId, TabSpec};
use crate::editor::TabViewState;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Tabs, tab order and active tab, kept consistent with each other.
///
/// `tabs` is always stored in display order, so `tabs()` and `order()` agree
/// element for element.
#[derive(Debug, Default)]
pub struct TabManager {
    tabs: Vec<Tab>,
    order: Vec<TabId>,
    active: Option<TabId>,
    next_id: u64,
    /// Logical clock behind `Tab::last_accessed`
    clock: u64,
    view_states: HashMap<TabId, TabViewState>,
    groups: TabGroups,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Tabs in display order.
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn order(&self) -> &[TabId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.get(id).is_some()
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    /// Display index of `id`.
    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.order.iter().position(|&t| t == id)
    }

    /// Find the tab showing `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.path.as_deref() == Some(path))
            .map(|t| t.id)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tabs.iter().any(|t| t.is_modified)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Opening and Closing
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a new tab and make it active.
    ///
    /// Does not check for an existing tab on the same path; use
    /// [`open_or_activate`](Self::open_or_activate) when that matters.
    pub fn add_tab(&mut self, spec: TabSpec) -> TabId {
        self.next_id += 1;
        let id = TabId(self.next_id);
        let now = self.tick();
        self.tabs.push(Tab::from_spec(id, spec, now));
        self.order.push(id);
        self.activate(id);
        debug!("Opened {} ({} tabs)", id, self.tabs.len());
        id
    }

    /// Activate the tab already showing `spec.path`, or add a new one.
    ///
    /// Returns the tab id and whether a tab was created.
    pub fn open_or_activate(&mut self, spec: TabSpec) -> (TabId, bool) {
        if let Some(existing) = spec.path.as_deref().and_then(|p| self.find_by_path(p)) {
            self.set_active(existing);
            return (existing, false);
        }
        (self.add_tab(spec), true)
    }

    /// Close one tab.
    ///
    /// When the active tab closes, the tab that slides into its index takes
    /// over, else the one before it, else nothing.
    pub fn close_tab(&mut self, id: TabId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.order.remove(index);
        self.forget(&[id]);

        if self.active == Some(id) {
            self.active = None;
            let next = self
                .order
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.order.get(i)))
                .copied();
            if let Some(next) = next {
                self.activate(next);
            }
        }
        debug!("Closed {} ({} tabs left)", id, self.tabs.len());
        true
    }

    /// Close every tab except `id`, which becomes active. Pinned tabs are
    /// closed like any other.
    pub fn close_others(&mut self, id: TabId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let removed: Vec<TabId> = self.order.iter().copied().filter(|&t| t != id).collect();
        self.order = vec![id];
        self.forget(&removed);
        self.activate(id);
        true
    }

    /// Close every tab after `id` in display order.
    ///
    /// If the active tab was among them, `id` becomes active.
    pub fn close_to_right(&mut self, id: TabId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let removed = self.order.split_off(index + 1);
        if removed.is_empty() {
            return false;
        }
        self.forget(&removed);
        if self.active.is_some_and(|a| removed.contains(&a)) {
            self.activate(id);
        }
        true
    }

    pub fn close_all(&mut self) {
        self.tabs.clear();
        self.order.clear();
        self.active = None;
        self.view_states.clear();
        self.groups.clear_members();
    }

    fn forget(&mut self, removed: &[TabId]) {
        self.tabs.retain(|t| !removed.contains(&t.id));
        for id in removed {
            self.view_states.remove(id);
            self.groups.remove_tab(*id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activation and Ordering
    // ─────────────────────────────────────────────────────────────────────────

    /// Make `id` the active tab. Returns `false` if it already was or does
    /// not exist.
    pub fn set_active(&mut self, id: TabId) -> bool {
        if self.active == Some(id) || !self.contains(id) {
            return false;
        }
        self.activate(id);
        true
    }

    /// Activate the tab after the active one, wrapping around.
    pub fn activate_next(&mut self) -> Option<TabId> {
        self.activate_offset(1)
    }

    /// Activate the tab before the active one, wrapping around.
    pub fn activate_previous(&mut self) -> Option<TabId> {
        self.activate_offset(self.order.len().saturating_sub(1))
    }

    fn activate_offset(&mut self, offset: usize) -> Option<TabId> {
        let len = self.order.len();
        let current = self.active.and_then(|id| self.index_of(id))?;
        let next = self.order[(current + offset) % len];
        self.set_active(next);
        Some(next)
    }

    fn activate(&mut self, id: TabId) {
        let now = self.tick();
        for tab in &mut self.tabs {
            tab.is_active = tab.id == id;
            if tab.id == id {
                tab.last_accessed = now;
            }
        }
        self.active = Some(id);
    }

    /// Move the tab at display index `from` to index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.order.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);

        let positions: HashMap<TabId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        self.tabs
            .sort_by_key(|t| positions.get(&t.id).copied().unwrap_or(usize::MAX));
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-Tab State
    // ─────────────────────────────────────────────────────────────────────────

    pub fn pin(&mut self, id: TabId) -> bool {
        self.set_pinned(id, true)
    }

    pub fn unpin(&mut self, id: TabId) -> bool {
        self.set_pinned(id, false)
    }

    fn set_pinned(&mut self, id: TabId, pinned: bool) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.is_pinned = pinned;
                true
            }
            None => false,
        }
    }

    /// Replace a tab's content. Does not touch `is_modified`.
    pub fn update_content(&mut self, id: TabId, content: impl Into<String>) -> bool {
        if !self.contains(id) {
            return false;
        }
        let now = self.tick();
        match self.get_mut(id) {
            Some(tab) => {
                tab.content = content.into();
                tab.last_accessed = now;
                true
            }
            None => false,
        }
    }

    pub fn mark_modified(&mut self, id: TabId, modified: bool) -> bool {
        match self.get_mut(id) {
            Some(tab) => {
                tab.is_modified = modified;
                true
            }
            None => false,
        }
    }

    /// Point a tab at a new file (Save As). Refused if another tab already
    /// shows `path`.
    pub fn set_path(&mut self, id: TabId, path: PathBuf) -> bool {
        if self.find_by_path(&path).is_some_and(|other| other != id) {
            return false;
        }
        match self.get_mut(id) {
            Some(tab) => {
                tab.set_path(path);
                true
            }
            None => false,
        }
    }

    pub fn set_view_state(&mut self, id: TabId, state: TabViewState) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.view_states.insert(id, state);
        true
    }

    pub fn view_state(&self, id: TabId) -> Option<&TabViewState> {
        self.view_states.get(&id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_group(&mut self, name: impl Into<String>) -> TabGroupId {
        self.groups.create(name)
    }

    pub fn add_to_group(&mut self, group: TabGroupId, tab: TabId) -> bool {
        self.contains(tab) && self.groups.add(group, tab)
    }

    pub fn remove_from_group(&mut self, tab: TabId) -> bool {
        self.groups.remove_tab(tab)
    }

    pub fn set_active_group(&mut self, group: TabGroupId) -> bool {
        self.groups.set_active(group)
    }

    pub fn delete_group(&mut self, group: TabGroupId) -> bool {
        self.groups.delete(group)
    }

    pub fn group(&self, group: TabGroupId) -> Option<&TabGroup> {
        self.groups.get(group)
    }

    pub fn group_of(&self, tab: TabId) -> Option<TabGroupId> {
        self.groups.group_of(tab)
    }

    pub fn groups(&self) -> impl Iterator<Item = &TabGroup> {
        self.groups.iter()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
