//! Named tab groups.

use super::tab::TabId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabGroupId(pub(crate) u64);

/// An ordered, named set of tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup {
    pub id: TabGroupId,
    pub name: String,
    pub members: Vec<TabId>,
    pub is_active: bool,
}

/// Group membership. A tab belongs to at most one group; empty groups stay
/// until deleted.
#[derive(Debug, Clone, Default)]
pub(crate) struct TabGroups {
    groups: Vec<TabGroup>,
    next_id: u64,
}

impl TabGroups {
    pub fn create(&mut self, name: impl Into<String>) -> TabGroupId {
        self.next_id += 1;
        let id = TabGroupId(self.next_id);
        self.groups.push(TabGroup {
            id,
            name: name.into(),
            members: Vec::new(),
            is_active: false,
        });
        id
    }

    pub fn get(&self, id: TabGroupId) -> Option<&TabGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TabGroup> {
        self.groups.iter()
    }

    /// Move `tab` into `group`, leaving whatever group it was in.
    pub fn add(&mut self, group: TabGroupId, tab: TabId) -> bool {
        if self.get(group).is_none() {
            return false;
        }
        self.remove_tab(tab);
        if let Some(g) = self.groups.iter_mut().find(|g| g.id == group) {
            g.members.push(tab);
        }
        true
    }

    /// Drop `tab` from its group. Returns whether it was in one.
    pub fn remove_tab(&mut self, tab: TabId) -> bool {
        let mut removed = false;
        for group in &mut self.groups {
            let before = group.members.len();
            group.members.retain(|&t| t != tab);
            removed |= group.members.len() != before;
        }
        removed
    }

    pub fn group_of(&self, tab: TabId) -> Option<TabGroupId> {
        self.groups
            .iter()
            .find(|g| g.members.contains(&tab))
            .map(|g| g.id)
    }

    pub fn set_active(&mut self, id: TabGroupId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        for group in &mut self.groups {
            group.is_active = group.id == id;
        }
        true
    }

    pub fn delete(&mut self, id: TabGroupId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        self.groups.len() != before
    }

    pub fn clear_members(&mut self) {
        for group in &mut self.groups {
            group.members.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_moves_between_groups() {
        let mut groups = TabGroups::default();
        let docs = groups.create("Docs");
        let code = groups.create("Code");

        assert!(groups.add(docs, TabId(1)));
        assert!(groups.add(code, TabId(1)));

        assert!(groups.get(docs).unwrap().members.is_empty());
        assert_eq!(groups.get(code).unwrap().members, vec![TabId(1)]);
        assert_eq!(groups.group_of(TabId(1)), Some(code));
    }

    #[test]
    fn test_add_to_unknown_group() {
        let mut groups = TabGroups::default();
        assert!(!groups.add(TabGroupId(42), TabId(1)));
        assert_eq!(groups.group_of(TabId(1)), None);
    }

    #[test]
    fn test_single_active_group() {
        let mut groups = TabGroups::default();
        let a = groups.create("A");
        let b = groups.create("B");

        groups.set_active(a);
        groups.set_active(b);

        assert!(!groups.get(a).unwrap().is_active);
        assert!(groups.get(b).unwrap().is_active);
    }

    #[test]
    fn test_empty_group_survives_member_removal() {
        let mut groups = TabGroups::default();
        let a = groups.create("A");
        groups.add(a, TabId(3));

        assert!(groups.remove_tab(TabId(3)));
        assert!(groups.get(a).is_some());
        assert!(!groups.remove_tab(TabId(3)));
    }

    #[test]
    fn test_delete_group() {
        let mut groups = TabGroups::default();
        let a = groups.create("A");
        assert!(groups.delete(a));
        assert!(!groups.delete(a));
        assert_eq!(groups.iter().count(), 0);
    }
}
