//! Application state management
//!
//! [`AppState`] is the facade a host UI drives. It owns the tab set, the
//! workspace explorer and the session manager, and turns every state change
//! into a debounced write so the session on disk follows the editor closely
//! without writing on every keystroke.
//!
//! Debounced writes and the auto-save timer spawn tokio tasks, so the state
//! must be driven from within a runtime.

use crate::actions::ActionRegistry;
use crate::concurrency::ConcurrencyGuard;
use crate::config::{save_config_silent, Settings, WindowState};
use crate::debounce::{Debouncer, PersistChannel};
use crate::editor::{capture_tab, restore_tab, EditorSurface};
use crate::error::{Error, Result};
use crate::files::{classify, decode_text, Encoding, FileSystem};
use crate::session::{
    AutoSaveTimer, FilePathRecovery, LoadOutcome, PersistenceService, SessionManager,
    SessionStore,
};
use crate::tabs::{TabId, TabManager, TabSpec};
use crate::workspaces::{FolderOutcome, Workspace};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Name given to sessions created on startup.
pub const DEFAULT_SESSION_NAME: &str = "Default";

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

/// UI-related state flags.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Whether the error banner is showing
    pub show_error_modal: bool,
    /// Error message for the banner
    pub error_message: String,
    /// Status bar message
    pub status_message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state struct.
///
/// This struct holds all runtime state for the engine including:
/// - Open tabs, their content and view state
/// - The open workspace folder and its file tree
/// - The current workspace session and its persistence
/// - User settings (loaded from config)
/// - UI state (error banner, status message)
///
/// # Example
///
/// ```ignore
/// let mut state = AppState::new(fs, Box::new(store), load_config(), None);
/// state.restore_last_session().await;
/// state.open_file(PathBuf::from("notes.md")).await?;
/// state.shutdown();
/// ```
pub struct AppState {
    fs: Arc<dyn FileSystem>,
    tabs: TabManager,
    workspace: Workspace,
    sessions: SessionManager,
    guard: ConcurrencyGuard,
    settings: Settings,
    /// Config file location; `None` uses the platform default
    config_path: Option<PathBuf>,
    /// Latest settings handed to debounced config writes
    pending_config: Arc<Mutex<Settings>>,
    debouncer: Debouncer,
    auto_save: AutoSaveTimer,
    /// Set by the auto-save timer, consumed by `poll_auto_save`
    auto_save_due: Arc<AtomicBool>,
    actions: Arc<ActionRegistry<AppState>>,
    /// UI-related state
    pub ui: UiState,
}

impl AppState {
    /// Wire up the engine around its collaborators.
    ///
    /// No session is current until [`restore_last_session`] or
    /// [`new_session`] runs.
    ///
    /// [`restore_last_session`]: Self::restore_last_session
    /// [`new_session`]: Self::new_session
    pub fn new(
        fs: Arc<dyn FileSystem>,
        store: Box<dyn SessionStore>,
        mut settings: Settings,
        config_path: Option<PathBuf>,
    ) -> Self {
        settings.sanitize();

        let guard = ConcurrencyGuard::new();
        let persistence = PersistenceService::new(store).with_backups(settings.backups_enabled);
        let sessions = SessionManager::new(
            persistence,
            FilePathRecovery::new(Arc::clone(&fs)),
            guard.clone(),
        );
        let workspace = Workspace::new(Arc::clone(&fs), guard.clone());
        let debouncer = Debouncer::new(Duration::from_millis(settings.persist_debounce_ms));

        info!("AppState initialized with settings");
        debug!(
            "Auto-save: {} every {}s, debounce {}ms",
            settings.auto_save, settings.auto_save_interval_secs, settings.persist_debounce_ms
        );

        Self {
            fs,
            tabs: TabManager::new(),
            workspace,
            sessions,
            guard,
            pending_config: Arc::new(Mutex::new(settings.clone())),
            settings,
            config_path,
            debouncer,
            auto_save: AutoSaveTimer::new(),
            auto_save_due: Arc::new(AtomicBool::new(false)),
            actions: Arc::new(default_actions()),
            ui: UiState::default(),
        }
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Open `path` in a tab, or switch to the tab that already shows it.
    ///
    /// A tab left behind for a missing file is refreshed from disk when the
    /// file is back. Binary files are refused.
    pub async fn open_file(&mut self, path: PathBuf) -> Result<TabId> {
        if let Some(id) = self.tabs.find_by_path(&path) {
            let missing = self.tabs.get(id).is_some_and(|t| t.missing);
            if !missing {
                self.tabs.set_active(id);
                info!("File already open, switching to {}", id);
                return Ok(id);
            }

            let (content, encoding) = self.read_document(&path).await?;
            if let Some(tab) = self.tabs.get_mut(id) {
                tab.missing = false;
                tab.encoding = encoding;
            }
            self.tabs.update_content(id, content);
            self.tabs.mark_modified(id, false);
            self.tabs.set_active(id);
            info!("Reloaded previously missing file: {}", path.display());
            self.request_session_save();
            return Ok(id);
        }

        let (content, encoding) = self.read_document(&path).await?;
        let id = self
            .tabs
            .add_tab(TabSpec::file(path.clone(), content).with_encoding(encoding));
        info!("Opened file: {} ({})", path.display(), encoding.label());

        self.settings.add_recent_file(path);
        self.schedule_config_save(PersistChannel::Preferences);
        self.request_session_save();
        Ok(id)
    }

    async fn read_document(&self, path: &Path) -> Result<(String, Encoding)> {
        let bytes = self
            .fs
            .read_binary_file(path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let classification = classify(&bytes);
        if !classification.is_text {
            return Err(Error::BinaryFile {
                path: path.to_path_buf(),
            });
        }
        Ok((
            decode_text(&bytes, classification.encoding),
            classification.encoding,
        ))
    }

    /// Open an empty, unsaved document.
    pub fn new_untitled(&mut self) -> TabId {
        let id = self.tabs.add_tab(TabSpec::untitled());
        debug!("Created untitled tab {}", id);
        self.request_session_save();
        id
    }

    /// Save the active tab to its file path.
    ///
    /// Returns an error if the tab has no path (use `save_active_tab_as`
    /// instead) or if its file was missing when the session was restored.
    pub async fn save_active_tab(&mut self) -> Result<()> {
        let tab = self
            .tabs
            .active_tab()
            .ok_or_else(|| Error::Application("No active tab".to_string()))?;
        let path = tab.path.clone().ok_or_else(|| {
            Error::Application("No file path set. Use 'Save As' instead.".to_string())
        })?;
        if tab.missing {
            return Err(Error::Application(format!(
                "'{}' could not be found. Use 'Save As' instead.",
                path.display()
            )));
        }
        let (id, content) = (tab.id, tab.content.clone());

        self.write_document(id, &path, &content).await?;
        info!("Saved file: {}", path.display());
        Ok(())
    }

    /// Save the active tab to a new path.
    pub async fn save_active_tab_as(&mut self, path: PathBuf) -> Result<()> {
        let tab = self
            .tabs
            .active_tab()
            .ok_or_else(|| Error::Application("No active tab".to_string()))?;
        let (id, content) = (tab.id, tab.content.clone());
        if tab.path.as_deref() != Some(path.as_path()) && self.tabs.find_by_path(&path).is_some() {
            return Err(Error::Application(format!(
                "'{}' is already open in another tab",
                path.display()
            )));
        }

        self.write_document(id, &path, &content).await?;
        if let Some(tab) = self.tabs.get_mut(id) {
            tab.missing = false;
            tab.encoding = Encoding::Utf8;
        }
        self.tabs.set_path(id, path.clone());

        self.settings.add_recent_file(path.clone());
        self.schedule_config_save(PersistChannel::Preferences);
        info!("Saved file as: {}", path.display());
        Ok(())
    }

    /// Documents are always written back as UTF-8.
    async fn write_document(&mut self, id: TabId, path: &Path, content: &str) -> Result<()> {
        self.fs
            .write_text_file(path, content)
            .await
            .map_err(|source| Error::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
        self.tabs.mark_modified(id, false);
        self.request_session_save();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tab Management
    // ─────────────────────────────────────────────────────────────────────────

    pub fn close_tab(&mut self, id: TabId) -> bool {
        let closed = self.tabs.close_tab(id);
        self.save_if(closed)
    }

    pub fn close_active_tab(&mut self) -> bool {
        match self.tabs.active_id() {
            Some(id) => self.close_tab(id),
            None => false,
        }
    }

    pub fn close_other_tabs(&mut self, id: TabId) -> bool {
        let closed = self.tabs.close_others(id);
        self.save_if(closed)
    }

    pub fn close_tabs_to_right(&mut self, id: TabId) -> bool {
        let closed = self.tabs.close_to_right(id);
        self.save_if(closed)
    }

    pub fn close_all_tabs(&mut self) {
        self.tabs.close_all();
        self.request_session_save();
    }

    pub fn set_active_tab(&mut self, id: TabId) -> bool {
        let switched = self.tabs.set_active(id);
        self.save_if(switched)
    }

    pub fn next_tab(&mut self) -> Option<TabId> {
        let id = self.tabs.activate_next();
        self.save_if(id.is_some());
        id
    }

    pub fn previous_tab(&mut self) -> Option<TabId> {
        let id = self.tabs.activate_previous();
        self.save_if(id.is_some());
        id
    }

    /// Move the tab at index `from` to index `to`.
    pub fn reorder_tabs(&mut self, from: usize, to: usize) -> bool {
        let moved = self.tabs.reorder(from, to);
        self.save_if(moved)
    }

    pub fn pin_tab(&mut self, id: TabId) -> bool {
        let changed = self.tabs.pin(id);
        self.save_if(changed)
    }

    pub fn unpin_tab(&mut self, id: TabId) -> bool {
        let changed = self.tabs.unpin(id);
        self.save_if(changed)
    }

    /// Replace the text of tab `id` after an edit and mark it modified.
    pub fn edit_tab(&mut self, id: TabId, content: impl Into<String>) -> bool {
        let updated = self.tabs.update_content(id, content) && self.tabs.mark_modified(id, true);
        self.save_if(updated)
    }

    /// Read the editor surface back into the active tab.
    pub fn capture_active_editor(&mut self, surface: &dyn EditorSurface) -> bool {
        let Some(id) = self.tabs.active_id() else {
            return false;
        };
        let captured = capture_tab(&mut self.tabs, id, surface);
        self.save_if(captured)
    }

    /// Load the active tab into the editor surface.
    pub fn restore_active_editor(&self, surface: &mut dyn EditorSurface) -> bool {
        match self.tabs.active_id() {
            Some(id) => restore_tab(&self.tabs, id, surface),
            None => false,
        }
    }

    /// Capture the editor into the active tab, switch to `id` and load it.
    pub fn switch_tab(&mut self, id: TabId, surface: &mut dyn EditorSurface) -> bool {
        if !self.tabs.contains(id) {
            return false;
        }
        self.capture_active_editor(surface);
        self.set_active_tab(id);
        self.restore_active_editor(surface)
    }

    fn save_if(&self, changed: bool) -> bool {
        if changed {
            self.request_session_save();
        }
        changed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Workspace Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask for a folder and open it as the workspace.
    ///
    /// Listing failures are shown in the error banner as well as returned.
    pub async fn open_folder(&mut self) -> Result<FolderOutcome> {
        let result = self.workspace.open_folder().await;
        self.finish_folder_open(result)
    }

    /// Open `folder` as the workspace without asking.
    pub async fn open_folder_at(&mut self, folder: PathBuf) -> Result<FolderOutcome> {
        let result = self.workspace.open_folder_at(folder).await;
        self.finish_folder_open(result)
    }

    fn finish_folder_open(&mut self, result: Result<FolderOutcome>) -> Result<FolderOutcome> {
        match &result {
            Ok(FolderOutcome::Opened(folder)) => {
                self.sessions.add_folder(folder.clone());
                self.settings.add_recent_workspace(folder.clone());
                self.schedule_config_save(PersistChannel::Preferences);
                self.request_session_save();
            }
            Ok(_) => {}
            Err(err) => self.show_error(err.to_string()),
        }
        result
    }

    /// Close the workspace folder. Open tabs are kept.
    pub fn close_folder(&mut self) {
        self.workspace.close_folder();
        info!("Workspace closed");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Reopen the session that was current at last shutdown.
    ///
    /// Falls back to a new, empty session when restoring is disabled, there
    /// is no last session, or it cannot be loaded. Returns the active tab.
    pub async fn restore_last_session(&mut self) -> Option<TabId> {
        let last = self
            .settings
            .last_session_id
            .clone()
            .filter(|_| self.settings.restore_last_session);

        if let Some(id) = last {
            match self.switch_session(&id).await {
                Ok(LoadOutcome::Loaded { .. }) | Ok(LoadOutcome::Superseded) => {
                    return self.tabs.active_id();
                }
                Ok(LoadOutcome::NotFound) => {
                    warn!("Last session {} no longer exists", id);
                }
                Err(err) => {
                    self.show_error(format!("Failed to restore session:\n{}", err));
                }
            }
        }

        self.new_session(DEFAULT_SESSION_NAME);
        self.tabs.active_id()
    }

    /// Make session `id` current and replace the open tabs with its files.
    ///
    /// Pending writes for the outgoing session are flushed first.
    pub async fn switch_session(&mut self, id: &str) -> Result<LoadOutcome> {
        self.debouncer.flush(PersistChannel::AppState);

        let outcome = self.sessions.load_session(id).await?;
        if let LoadOutcome::Loaded { session, report } = &outcome {
            SessionManager::rehydrate(session, &mut self.tabs);
            if !report.missing.is_empty() {
                self.ui.status_message = Some(format!(
                    "{} file(s) from this session could not be found",
                    report.missing.len()
                ));
            }
            if let Some(folder) = session.folder_paths.first().cloned() {
                if let Err(err) = self.workspace.open_folder_at(folder).await {
                    warn!("Could not reopen workspace folder: {}", err);
                }
            }
            self.remember_session(session.id.clone());
        }
        Ok(outcome)
    }

    /// Start a new, empty session around the current tabs.
    ///
    /// Pending writes for the outgoing session are flushed first.
    pub fn new_session(&mut self, name: &str) -> String {
        self.debouncer.flush(PersistChannel::AppState);
        let id = self.sessions.create_session(
            name,
            self.settings.window,
            self.settings.editor.clone(),
        );
        self.remember_session(id.clone());
        self.request_session_save();
        id
    }

    /// Delete session `id` and its backup.
    ///
    /// Deleting the current session drops its pending save and leaves no
    /// session current.
    pub fn delete_session(&mut self, id: &str) -> Result<bool> {
        if self.sessions.current_id().as_deref() == Some(id) {
            self.debouncer.cancel(PersistChannel::AppState);
        }
        let deleted = self.sessions.delete_session(id)?;
        if self.settings.last_session_id.as_deref() == Some(id) {
            self.settings.last_session_id = None;
            self.schedule_config_save(PersistChannel::Preferences);
        }
        info!("Deleted session {}", id);
        Ok(deleted)
    }

    fn remember_session(&mut self, id: String) {
        if self.settings.last_session_id.as_deref() != Some(id.as_str()) {
            self.settings.last_session_id = Some(id);
            self.schedule_config_save(PersistChannel::Preferences);
        }
    }

    /// Snapshot live state and save it on the session channel once edits
    /// settle.
    pub fn request_session_save(&self) {
        let Some(snapshot) = self.sessions.capture_snapshot(
            &self.tabs,
            &self.settings.window,
            &self.settings.editor,
        ) else {
            return;
        };
        let persistence = self.sessions.persistence().clone();
        self.debouncer
            .schedule(PersistChannel::AppState, move || {
                if let Err(err) = persistence.save(&snapshot) {
                    warn!("Debounced session save failed: {}", err);
                }
            });
    }

    /// Save the current session immediately, dropping any pending
    /// debounced save. `Ok(None)` when no session is current.
    pub fn persist_session_now(&mut self) -> Result<Option<String>> {
        self.debouncer.cancel(PersistChannel::AppState);
        self.sessions
            .update_current_session(&self.tabs, &self.settings.window, &self.settings.editor)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auto-Save
    // ─────────────────────────────────────────────────────────────────────────

    /// Start the periodic session save if enabled in settings.
    pub fn start_auto_save(&mut self) -> bool {
        if !self.settings.auto_save {
            debug!("Auto-save disabled in settings");
            return false;
        }
        let interval = Duration::from_secs(u64::from(self.settings.auto_save_interval_secs));
        let due = Arc::clone(&self.auto_save_due);
        self.auto_save
            .start(interval, move || due.store(true, Ordering::SeqCst))
    }

    pub fn stop_auto_save(&mut self) -> bool {
        self.auto_save_due.store(false, Ordering::SeqCst);
        self.auto_save.stop()
    }

    pub fn is_auto_save_running(&self) -> bool {
        self.auto_save.is_running()
    }

    /// Save the session if the auto-save timer fired since the last poll.
    ///
    /// Call this from the host's update loop.
    pub fn poll_auto_save(&mut self) -> bool {
        if !self.auto_save_due.swap(false, Ordering::SeqCst) {
            return false;
        }
        match self.persist_session_now() {
            Ok(Some(id)) => {
                debug!("Auto-saved session {}", id);
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("Auto-save failed: {}", err);
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Update settings and save them once changes settle.
    ///
    /// A running auto-save timer picks up a changed interval.
    pub fn update_settings<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let before = (self.settings.auto_save, self.settings.auto_save_interval_secs);
        f(&mut self.settings);
        self.settings.sanitize();

        let after = (self.settings.auto_save, self.settings.auto_save_interval_secs);
        if before != after && self.auto_save.is_running() {
            self.stop_auto_save();
            self.start_auto_save();
        }
        self.schedule_config_save(PersistChannel::Preferences);
    }

    /// Record new window geometry. Written to config and the session once
    /// resizing stops.
    pub fn set_window_state(&mut self, mut window: WindowState) {
        window.sanitize();
        if self.settings.window == window {
            return;
        }
        self.settings.window = window;
        self.schedule_config_save(PersistChannel::WindowState);
        self.request_session_save();
    }

    /// Both config channels write the same file, so whichever fires writes
    /// the newest settings.
    fn schedule_config_save(&self, channel: PersistChannel) {
        *self.pending_config.lock() = self.settings.clone();
        let pending = Arc::clone(&self.pending_config);
        let config_path = self.config_path.clone();
        self.debouncer.schedule(channel, move || {
            save_config_silent(config_path.as_deref(), &pending.lock());
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Run the action registered under `id`.
    ///
    /// Unknown ids fail with [`Error::UnknownAction`].
    pub fn dispatch_action(&mut self, id: &str) -> Result<()> {
        let actions = Arc::clone(&self.actions);
        actions.execute(id, self)
    }

    /// Register an extra action. Fails while an action is running.
    pub fn register_action(
        &mut self,
        id: &str,
        label: &str,
        handler: impl Fn(&mut AppState) -> Result<()> + Send + Sync + 'static,
    ) -> bool {
        match Arc::get_mut(&mut self.actions) {
            Some(actions) => {
                actions.register(id, label, handler);
                true
            }
            None => {
                warn!("Cannot register action {} while actions are running", id);
                false
            }
        }
    }

    /// `(id, label)` of every registered action.
    pub fn actions(&self) -> Vec<(String, String)> {
        self.actions
            .list()
            .into_iter()
            .map(|(id, label)| (id.to_string(), label.to_string()))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UI State Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Show an error in the banner.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.ui.error_message = message.into();
        self.ui.show_error_modal = true;
    }

    /// Dismiss the error banner.
    pub fn dismiss_error(&mut self) {
        self.ui.show_error_modal = false;
        self.ui.error_message.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shutdown
    // ─────────────────────────────────────────────────────────────────────────

    /// Prepare state for application shutdown.
    ///
    /// Stops the timer, runs pending writes, saves the session and settings,
    /// and cancels anything still loading.
    pub fn shutdown(&mut self) {
        self.stop_auto_save();
        self.debouncer.flush_all();

        match self.persist_session_now() {
            Ok(Some(id)) => self.settings.last_session_id = Some(id),
            Ok(None) => {}
            Err(err) => warn!("Failed to save session during shutdown: {}", err),
        }
        save_config_silent(self.config_path.as_deref(), &self.settings);

        self.guard.cancel_all();
        info!("AppState shutdown complete");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Actions
// ─────────────────────────────────────────────────────────────────────────────

fn default_actions() -> ActionRegistry<AppState> {
    let mut actions = ActionRegistry::new();
    actions.register("tab.new", "New Tab", |state: &mut AppState| {
        state.new_untitled();
        Ok(())
    });
    actions.register("tab.close", "Close Tab", |state: &mut AppState| {
        state.close_active_tab();
        Ok(())
    });
    actions.register("tab.closeOthers", "Close Other Tabs", |state: &mut AppState| {
        if let Some(id) = state.tabs.active_id() {
            state.close_other_tabs(id);
        }
        Ok(())
    });
    actions.register(
        "tab.closeToRight",
        "Close Tabs to the Right",
        |state: &mut AppState| {
            if let Some(id) = state.tabs.active_id() {
                state.close_tabs_to_right(id);
            }
            Ok(())
        },
    );
    actions.register("tab.closeAll", "Close All Tabs", |state: &mut AppState| {
        state.close_all_tabs();
        Ok(())
    });
    actions.register("tab.next", "Next Tab", |state: &mut AppState| {
        state.next_tab();
        Ok(())
    });
    actions.register("tab.previous", "Previous Tab", |state: &mut AppState| {
        state.previous_tab();
        Ok(())
    });
    actions.register("tab.togglePin", "Pin/Unpin Tab", |state: &mut AppState| {
        if let Some(tab) = state.tabs.active_tab() {
            let (id, pinned) = (tab.id, tab.is_pinned);
            if pinned {
                state.unpin_tab(id);
            } else {
                state.pin_tab(id);
            }
        }
        Ok(())
    });
    actions.register("session.save", "Save Session", |state: &mut AppState| {
        state.persist_session_now().map(|_| ())
    });
    actions.register("workspace.close", "Close Folder", |state: &mut AppState| {
        state.close_folder();
        Ok(())
    });
    actions.register("app.dismissError", "Dismiss Error", |state: &mut AppState| {
        state.dismiss_error();
        Ok(())
    });
    actions
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
