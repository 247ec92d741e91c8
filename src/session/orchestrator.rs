//! The current session and its lifecycle.
//!
//! [`SessionManager`] owns the single in-memory current session and drives
//! capture, save, load (with migration and file recovery) and re-hydration
//! of the tab set.

use super::model::{SessionSummary, WorkspaceSession};
use super::persistence::PersistenceService;
use super::recovery::{FilePathRecovery, RecoveryReport};
use crate::concurrency::{ConcurrencyGuard, OperationClass};
use crate::config::{EditorSettings, WindowState};
use crate::error::Result;
use crate::tabs::{TabId, TabManager, TabSpec};
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Result of [`SessionManager::load_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The session is now current
    Loaded {
        session: WorkspaceSession,
        report: RecoveryReport,
    },
    /// No record (and no usable backup) for that id
    NotFound,
    /// A newer load started while this one was running; nothing changed
    Superseded,
}

pub struct SessionManager {
    persistence: PersistenceService,
    recovery: FilePathRecovery,
    guard: ConcurrencyGuard,
    current: Mutex<Option<WorkspaceSession>>,
}

impl SessionManager {
    pub fn new(
        persistence: PersistenceService,
        recovery: FilePathRecovery,
        guard: ConcurrencyGuard,
    ) -> Self {
        Self {
            persistence,
            recovery,
            guard,
            current: Mutex::new(None),
        }
    }

    pub fn persistence(&self) -> &PersistenceService {
        &self.persistence
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Current Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a new, empty session and make it current. Nothing is written.
    pub fn create_session(
        &self,
        name: &str,
        window: WindowState,
        editor: EditorSettings,
    ) -> String {
        let session = WorkspaceSession::new(name, window, editor);
        let id = session.id.clone();
        info!("Created session '{}' ({})", name, id);
        *self.current.lock() = Some(session);
        id
    }

    pub fn current_session(&self) -> Option<WorkspaceSession> {
        self.current.lock().clone()
    }

    pub fn current_id(&self) -> Option<String> {
        self.current.lock().as_ref().map(|s| s.id.clone())
    }

    /// Take a fresh snapshot of live state into the current session without
    /// writing it.
    pub fn capture_snapshot(
        &self,
        tabs: &TabManager,
        window: &WindowState,
        editor: &EditorSettings,
    ) -> Option<WorkspaceSession> {
        let mut current = self.current.lock();
        let snapshot = current.as_ref()?.capture(tabs, window, editor);
        *current = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Snapshot live state and save it. `Ok(None)` when there is no current
    /// session.
    pub fn update_current_session(
        &self,
        tabs: &TabManager,
        window: &WindowState,
        editor: &EditorSettings,
    ) -> Result<Option<String>> {
        match self.capture_snapshot(tabs, window, editor) {
            Some(snapshot) => self.persistence.save(&snapshot).map(Some),
            None => {
                debug!("No current session to save");
                Ok(None)
            }
        }
    }

    /// Add a workspace folder to the current session.
    pub fn add_folder(&self, folder: PathBuf) -> bool {
        let mut current = self.current.lock();
        match current.as_mut() {
            Some(session) => {
                let added = session.add_folder(folder);
                if added {
                    session.touch();
                }
                added
            }
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Load / Delete / List
    // ─────────────────────────────────────────────────────────────────────────

    /// Load, repair and make current the session `id`.
    ///
    /// Only the latest of overlapping loads commits. The tab set is not
    /// touched; see [`rehydrate`](Self::rehydrate).
    pub async fn load_session(&self, id: &str) -> Result<LoadOutcome> {
        let operation = self.guard.begin(OperationClass::LoadSession);

        let Some(session) = self.persistence.load(id)? else {
            info!("Session {} not found", id);
            return Ok(LoadOutcome::NotFound);
        };
        let (session, report) = self.recovery.recover_file_paths(session).await;
        let mut session = self.recovery.handle_missing_files(session);
        session.last_accessed = Utc::now();

        let committed = operation.token().commit(|| {
            *self.current.lock() = Some(session.clone());
        });
        Ok(match committed {
            Some(()) => {
                info!(
                    "Loaded session '{}' ({} files, {} relocated, {} missing)",
                    session.name,
                    session.open_files.len(),
                    report.relocated.len(),
                    report.missing.len()
                );
                LoadOutcome::Loaded { session, report }
            }
            None => LoadOutcome::Superseded,
        })
    }

    /// Delete a session and its backup. Clears the current session if it
    /// was the one deleted.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let deleted = self.persistence.delete(id)?;
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|s| s.id == id) {
            *current = None;
        }
        Ok(deleted)
    }

    /// Summaries of every stored session, most recently accessed first.
    /// Unreadable sessions are skipped.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = self
            .persistence
            .list_ids()?
            .iter()
            .filter_map(|id| match self.persistence.load(id) {
                Ok(session) => session.map(|s| s.summary()),
                Err(err) => {
                    warn!("Skipping session {}: {}", id, err);
                    None
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        Ok(summaries)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Re-hydration
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the tab set with one tab per entry of `session`.
    ///
    /// Pin and modified flags and view state are restored, and the
    /// session's active tab becomes active again (the first tab if it is
    /// gone). Returns the active tab.
    pub fn rehydrate(session: &WorkspaceSession, tabs: &mut TabManager) -> Option<TabId> {
        tabs.close_all();
        let mut ids: HashMap<TabId, TabId> = HashMap::new();

        for file in &session.open_files {
            let spec = TabSpec {
                path: file.path(),
                content: file.content.clone(),
                encoding: file.encoding,
                missing: file.is_missing(),
            };
            let (id, created) = tabs.open_or_activate(spec);
            if !created {
                warn!("Session lists {} twice, keeping one tab", file.original_path());
            }
            if file.is_pinned {
                tabs.pin(id);
            }
            tabs.mark_modified(id, file.is_modified);
            tabs.set_view_state(id, file.view_state());
            ids.insert(file.tab_id, id);
        }

        let active = session
            .active_tab_id
            .and_then(|old| ids.get(&old).copied())
            .or_else(|| tabs.order().first().copied());
        if let Some(active) = active {
            tabs.set_active(active);
        }
        debug!("Re-hydrated {} tabs", tabs.len());
        tabs.active_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{CursorPosition, TabViewState};
    use crate::files::memory::MemoryFileSystem;
    use crate::session::store::{MemoryStore, Namespace};
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixture {
        manager: Arc<SessionManager>,
        store: MemoryStore,
        fs: Arc<MemoryFileSystem>,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let fs = Arc::new(MemoryFileSystem::new());
        let manager = SessionManager::new(
            PersistenceService::new(Box::new(store.clone())),
            FilePathRecovery::new(fs.clone()),
            ConcurrencyGuard::new(),
        );
        Fixture {
            manager: Arc::new(manager),
            store,
            fs,
        }
    }

    fn create(manager: &SessionManager, name: &str) -> String {
        manager.create_session(name, WindowState::default(), EditorSettings::default())
    }

    #[test]
    fn test_create_session_sets_current() {
        let f = fixture();
        let id = create(&f.manager, "Work");

        let current = f.manager.current_session().unwrap();
        assert_eq!(current.id, id);
        assert!(current.open_files.is_empty());
        assert_eq!(f.store.write_count(), 0);
    }

    #[test]
    fn test_update_current_session_saves_snapshot() {
        let f = fixture();
        let id = create(&f.manager, "Work");
        let before = f.manager.current_session().unwrap().timestamp;
        let mut tabs = TabManager::new();
        tabs.add_tab(TabSpec::file("/w/a.md", "a"));

        let saved = f
            .manager
            .update_current_session(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();

        assert_eq!(saved, Some(id.clone()));
        let current = f.manager.current_session().unwrap();
        assert!(current.timestamp > before);
        assert_eq!(current.open_files.len(), 1);
        assert!(f.store.get_raw(Namespace::Primary, &id).is_some());
    }

    #[test]
    fn test_update_without_session() {
        let f = fixture();
        let tabs = TabManager::new();
        let saved = f
            .manager
            .update_current_session(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();
        assert_eq!(saved, None);
    }

    #[tokio::test]
    async fn test_load_session_recovers_paths() {
        let f = fixture();
        f.fs.add_file("/w/kept.md", "");
        let id = create(&f.manager, "Work");
        f.manager.add_folder(PathBuf::from("/w"));
        let mut tabs = TabManager::new();
        tabs.add_tab(TabSpec::file("/w/kept.md", "k"));
        tabs.add_tab(TabSpec::file("/w/deleted.md", "d"));
        f.manager
            .update_current_session(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();

        create(&f.manager, "Other");
        let outcome = f.manager.load_session(&id).await.unwrap();

        let LoadOutcome::Loaded { session, report } = outcome else {
            panic!("expected a loaded session");
        };
        assert_eq!(session.id, id);
        assert_eq!(session.open_files.len(), 2);
        assert!(session.open_files[1].is_missing());
        assert_eq!(report.missing.len(), 1);
        assert_eq!(f.manager.current_id(), Some(id));
    }

    #[tokio::test]
    async fn test_load_unknown_session() {
        let f = fixture();
        let outcome = f.manager.load_session("missing").await.unwrap();
        assert_eq!(outcome, LoadOutcome::NotFound);
        assert!(f.manager.current_session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_loads_last_wins() {
        let f = fixture();
        let slow = create(&f.manager, "Slow");
        f.manager.add_folder(PathBuf::from("/slow"));
        let mut tabs = TabManager::new();
        tabs.add_tab(TabSpec::file("/slow/gone.md", ""));
        f.manager
            .update_current_session(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();
        let fast = create(&f.manager, "Fast");
        f.manager
            .update_current_session(&TabManager::new(), &WindowState::default(), &EditorSettings::default())
            .unwrap();
        // Recovering the slow session has to search a folder that lists slowly.
        f.fs.add_dir("/slow");
        f.fs.set_list_delay("/slow", Duration::from_millis(100));

        let (first, second) = tokio::join!(f.manager.load_session(&slow), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            f.manager.load_session(&fast).await
        });

        assert_eq!(first.unwrap(), LoadOutcome::Superseded);
        assert!(matches!(second.unwrap(), LoadOutcome::Loaded { .. }));
        assert_eq!(f.manager.current_id(), Some(fast));
    }

    #[test]
    fn test_delete_current_session() {
        let f = fixture();
        let id = create(&f.manager, "Work");
        f.manager
            .update_current_session(&TabManager::new(), &WindowState::default(), &EditorSettings::default())
            .unwrap();

        assert!(f.manager.delete_session(&id).unwrap());
        assert!(f.manager.current_session().is_none());
        assert!(f.manager.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_list_sessions_skips_corrupt_and_sorts() {
        let f = fixture();
        let older = create(&f.manager, "Older");
        f.manager
            .update_current_session(&TabManager::new(), &WindowState::default(), &EditorSettings::default())
            .unwrap();
        let newer = create(&f.manager, "Newer");
        f.manager
            .update_current_session(&TabManager::new(), &WindowState::default(), &EditorSettings::default())
            .unwrap();
        f.store.put_raw(Namespace::Primary, "broken", "not json");

        let ids: Vec<String> = f
            .manager
            .list_sessions()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();

        assert_eq!(ids, vec![newer, older]);
    }

    #[test]
    fn test_rehydrate_restores_tabs() {
        let f = fixture();
        create(&f.manager, "Work");
        let mut tabs = TabManager::new();
        let a = tabs.add_tab(TabSpec::file("/w/a.md", "alpha"));
        let b = tabs.add_tab(TabSpec::file("/w/b.md", "beta"));
        tabs.add_tab(TabSpec::untitled());
        tabs.pin(a);
        tabs.mark_modified(b, true);
        tabs.set_view_state(
            b,
            TabViewState {
                cursor: CursorPosition::new(7, 1),
                ..Default::default()
            },
        );
        tabs.set_active(b);
        let session = f
            .manager
            .capture_snapshot(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();

        let mut restored = TabManager::new();
        let active = SessionManager::rehydrate(&session, &mut restored).unwrap();

        assert_eq!(restored.len(), 3);
        let titles: Vec<&str> = restored.tabs().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a.md", "b.md", "Untitled"]);
        assert!(restored.tabs()[0].is_pinned);
        let active_tab = restored.get(active).unwrap();
        assert_eq!(active_tab.content, "beta");
        assert!(active_tab.is_modified);
        assert_eq!(restored.view_state(active).unwrap().cursor.line, 7);
    }

    #[test]
    fn test_rehydrate_falls_back_to_first_tab() {
        let f = fixture();
        create(&f.manager, "Work");
        let mut tabs = TabManager::new();
        tabs.add_tab(TabSpec::file("/w/a.md", ""));
        tabs.add_tab(TabSpec::file("/w/b.md", ""));
        let mut session = f
            .manager
            .capture_snapshot(&tabs, &WindowState::default(), &EditorSettings::default())
            .unwrap();
        session.active_tab_id = None;

        let mut restored = TabManager::new();
        let active = SessionManager::rehydrate(&session, &mut restored);

        assert_eq!(active, restored.order().first().copied());
    }

    #[test]
    fn test_rehydrate_keeps_missing_tabs() {
        let mut session =
            WorkspaceSession::new("Work", WindowState::default(), EditorSettings::default());
        let mut tabs = TabManager::new();
        tabs.add_tab(TabSpec::file("/gone/x.md", "placeholder").missing());
        session = session.capture(&tabs, &WindowState::default(), &EditorSettings::default());

        let mut restored = TabManager::new();
        SessionManager::rehydrate(&session, &mut restored);

        let tab = &restored.tabs()[0];
        assert!(tab.missing);
        assert_eq!(tab.title, "x.md");
    }
}
