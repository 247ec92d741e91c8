//! Validated, versioned session persistence with a single backup slot.

use super::migration::migrate;
use super::model::WorkspaceSession;
use super::store::{Namespace, SessionStore};
use crate::error::{Error, Result, ValidationError};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Saves, loads, backs up and restores sessions through a [`SessionStore`].
///
/// Cloning is cheap; clones share the store, so a clone can be moved into a
/// debounced write.
#[derive(Clone)]
pub struct PersistenceService {
    store: Arc<Mutex<Box<dyn SessionStore>>>,
    backups_enabled: bool,
}

impl PersistenceService {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            backups_enabled: true,
        }
    }

    pub fn with_backups(mut self, enabled: bool) -> Self {
        self.backups_enabled = enabled;
        self
    }

    pub fn backups_enabled(&self) -> bool {
        self.backups_enabled
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Required-field check on a typed session.
    pub fn validate(session: &WorkspaceSession) -> std::result::Result<(), ValidationError> {
        if session.id.trim().is_empty() {
            return Err(ValidationError::new("session id is required"));
        }
        if session.name.trim().is_empty() {
            return Err(ValidationError::new("session name is required"));
        }
        Ok(())
    }

    /// Required-field check on a raw, migrated record.
    pub fn validate_record(record: &Value) -> std::result::Result<(), ValidationError> {
        let Some(fields) = record.as_object() else {
            return Err(ValidationError::new("session record is not an object"));
        };
        for field in ["id", "name"] {
            let present = fields
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(ValidationError::new(format!("missing field '{}'", field)));
            }
        }
        if fields.get("timestamp").map_or(true, Value::is_null) {
            return Err(ValidationError::new("missing field 'timestamp'"));
        }
        if !fields.get("open_files").is_some_and(Value::is_array) {
            return Err(ValidationError::new("'open_files' must be a list"));
        }
        Ok(())
    }

    /// Parse, migrate and validate a stored record.
    fn decode(raw: &str) -> Result<WorkspaceSession> {
        let record = migrate(serde_json::from_str(raw)?);
        Self::validate_record(&record)?;
        let session: WorkspaceSession = serde_json::from_value(record)?;
        Self::validate(&session)?;
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Save / Load
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate and write `session`, then refresh its backup.
    ///
    /// Nothing is written when validation fails.
    pub fn save(&self, session: &WorkspaceSession) -> Result<String> {
        Self::validate(session)?;
        let record = serde_json::to_string_pretty(session)?;
        self.store
            .lock()
            .write(Namespace::Primary, &session.id, &record)?;
        if self.backups_enabled {
            self.write_backup(&session.id, &record)?;
        }
        info!(
            "Saved session '{}' ({} open files)",
            session.name,
            session.open_files.len()
        );
        Ok(session.id.clone())
    }

    /// Load a session. A missing record or an id that cannot name a record
    /// is `Ok(None)`; a corrupt record falls back to the backup.
    pub fn load(&self, id: &str) -> Result<Option<WorkspaceSession>> {
        let raw = self.read_slot(Namespace::Primary, id)?;
        let Some(raw) = raw else {
            debug!("No session record for {}", id);
            return Ok(None);
        };
        match Self::decode(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("Session {} is unreadable ({}), trying backup", id, err);
                self.restore(id)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backup / Restore
    // ─────────────────────────────────────────────────────────────────────────

    /// Overwrite the backup slot for `session`.
    pub fn backup(&self, session: &WorkspaceSession) -> Result<()> {
        let record = serde_json::to_string_pretty(session)?;
        self.write_backup(&session.id, &record)
    }

    fn write_backup(&self, id: &str, record: &str) -> Result<()> {
        self.store.lock().write(Namespace::Backup, id, record)
    }

    /// Read the backup slot. Missing or unusable backups are `Ok(None)`.
    pub fn restore(&self, id: &str) -> Result<Option<WorkspaceSession>> {
        let raw = self.read_slot(Namespace::Backup, id)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match Self::decode(&raw) {
            Ok(session) => {
                info!("Restored session {} from backup", id);
                Ok(Some(session))
            }
            Err(err) => {
                warn!("Backup for session {} is unusable: {}", id, err);
                Ok(None)
            }
        }
    }

    fn read_slot(&self, namespace: Namespace, id: &str) -> Result<Option<String>> {
        match self.store.lock().read(namespace, id) {
            Err(Error::InvalidSessionId(id)) => {
                debug!("Ignoring read of unusable session id '{}'", id);
                Ok(None)
            }
            other => other,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Remove a session and its backup. Returns whether anything existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut store = self.store.lock();
        let primary = store.remove(Namespace::Primary, id)?;
        let backup = store.remove(Namespace::Backup, id)?;
        Ok(primary || backup)
    }

    /// Ids with a primary record.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        self.store.lock().list(Namespace::Primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorSettings, WindowState};
    use crate::session::store::MemoryStore;
    use serde_json::json;

    fn service() -> (PersistenceService, MemoryStore) {
        let store = MemoryStore::new();
        (PersistenceService::new(Box::new(store.clone())), store)
    }

    fn session(name: &str) -> WorkspaceSession {
        WorkspaceSession::new(name, WindowState::default(), EditorSettings::default())
    }

    #[test]
    fn test_save_then_load() {
        let (service, _) = service();
        let s = session("Work");

        let id = service.save(&s).unwrap();

        assert_eq!(id, s.id);
        assert_eq!(service.load(&id).unwrap(), Some(s));
    }

    #[test]
    fn test_rich_session_round_trips_through_json_files() {
        use crate::editor::{CursorPosition, EditorViewState, ScrollPosition, Selection};
        use crate::files::Encoding;
        use crate::session::model::OpenFileState;
        use crate::session::store::JsonFileStore;
        use crate::tabs::{Language, TabId};
        use std::path::PathBuf;

        let dir = tempfile::TempDir::new().unwrap();
        let service = PersistenceService::new(Box::new(JsonFileStore::new(dir.path())));

        let mut s = session("Rich");
        s.folder_paths = vec![PathBuf::from("/work/site"), PathBuf::from("/work/notes")];
        s.open_files = vec![
            OpenFileState {
                file_path: "/work/site/README.md".to_string(),
                tab_id: TabId(1),
                title: "README.md".to_string(),
                content: "# Site\n\nDraft".to_string(),
                is_modified: true,
                is_pinned: false,
                cursor: CursorPosition::new(2, 5),
                scroll: ScrollPosition { top: 120.5, left: 0.0 },
                selections: vec![Selection {
                    start: CursorPosition::new(0, 0),
                    end: CursorPosition::new(0, 6),
                }],
                view_state: Some(EditorViewState("blob".into())),
                language: Language::Markdown,
                encoding: Encoding::Utf8Bom,
            },
            OpenFileState {
                file_path: String::new(),
                tab_id: TabId(7),
                title: "Untitled-1".to_string(),
                content: "{}".to_string(),
                is_modified: false,
                is_pinned: true,
                cursor: CursorPosition::new(0, 1),
                scroll: ScrollPosition::default(),
                selections: Vec::new(),
                view_state: None,
                language: Language::Json,
                encoding: Encoding::Utf8,
            },
        ];
        s.active_tab_id = Some(TabId(7));

        service.save(&s).unwrap();

        assert_eq!(service.load(&s.id).unwrap(), Some(s.clone()));
        assert_eq!(service.restore(&s.id).unwrap(), Some(s));
    }

    #[test]
    fn test_empty_id_is_rejected_without_writing() {
        let (service, store) = service();
        let mut s = session("Work");
        s.id = String::new();

        let err = service.save(&s).unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut s = session("Work");
        assert!(PersistenceService::validate(&s).is_ok());

        s.id = "  ".to_string();
        let err = PersistenceService::validate(&s).unwrap_err();
        assert!(err.message().contains("id"));
    }

    #[test]
    fn test_load_unusable_id_is_none() {
        let (service, _) = service();
        assert_eq!(service.load("a/b").unwrap(), None);
        assert_eq!(service.load("").unwrap(), None);
        assert_eq!(service.restore("../escape").unwrap(), None);
    }

    #[test]
    fn test_save_writes_backup() {
        let (service, store) = service();
        let s = session("Work");
        service.save(&s).unwrap();

        assert!(store.get_raw(Namespace::Backup, &s.id).is_some());
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_save_without_backups() {
        let store = MemoryStore::new();
        let service = PersistenceService::new(Box::new(store.clone())).with_backups(false);
        let s = session("Work");
        service.save(&s).unwrap();

        assert!(store.get_raw(Namespace::Backup, &s.id).is_none());
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_invalid_session_is_not_written() {
        let (service, store) = service();
        let mut s = session("Work");
        s.name = "   ".to_string();

        let result = service.save(&s);

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_load_missing_is_none() {
        let (service, _) = service();
        assert_eq!(service.load("does-not-exist").unwrap(), None);
    }

    #[test]
    fn test_corrupt_record_falls_back_to_backup() {
        let (service, store) = service();
        let s = session("Work");
        service.save(&s).unwrap();
        store.put_raw(Namespace::Primary, &s.id, "{ not json");

        assert_eq!(service.load(&s.id).unwrap(), Some(s));
    }

    #[test]
    fn test_invalid_record_without_backup_is_none() {
        let (service, store) = service();
        store.put_raw(
            Namespace::Primary,
            "s1",
            &json!({ "id": "s1", "name": "X", "timestamp": "2024-01-01T00:00:00Z", "open_files": "nope" })
                .to_string(),
        );

        assert_eq!(service.load("s1").unwrap(), None);
    }

    #[test]
    fn test_validate_record() {
        let valid = json!({
            "id": "a", "name": "b", "timestamp": "2024-01-01T00:00:00Z", "open_files": []
        });
        assert!(PersistenceService::validate_record(&valid).is_ok());

        let no_timestamp = json!({ "id": "a", "name": "b", "open_files": [] });
        let err = PersistenceService::validate_record(&no_timestamp).unwrap_err();
        assert!(err.message().contains("timestamp"));

        let files_not_list = json!({ "id": "a", "name": "b", "timestamp": "t", "open_files": {} });
        assert!(PersistenceService::validate_record(&files_not_list).is_err());

        assert!(PersistenceService::validate_record(&json!("text")).is_err());
    }

    #[test]
    fn test_legacy_record_is_migrated_on_load() {
        let (service, store) = service();
        let legacy = json!({
            "id": "old",
            "name": "Legacy",
            "timestamp": "2024-03-01T12:00:00Z",
            "folder_path": "/projects/site",
            "open_files": [
                { "path": "/projects/site/index.md", "tab_id": 4, "title": "index.md",
                  "content": "# Hi", "cursor_position": [2, 1], "scroll_offset": 30.0 }
            ]
        });
        store.put_raw(Namespace::Primary, "old", &legacy.to_string());

        let loaded = service.load("old").unwrap().unwrap();

        assert_eq!(loaded.version, crate::session::CURRENT_SCHEMA_VERSION);
        assert_eq!(loaded.folder_paths.len(), 1);
        assert_eq!(loaded.open_files[0].file_path, "/projects/site/index.md");
        assert_eq!(loaded.open_files[0].cursor.line, 2);
        assert_eq!(loaded.open_files[0].content, "# Hi");
    }

    #[test]
    fn test_backup_is_single_slot() {
        let (service, store) = service();
        let mut s = session("First");
        service.backup(&s).unwrap();
        s.name = "Second".to_string();
        service.backup(&s).unwrap();

        let restored = service.restore(&s.id).unwrap().unwrap();
        assert_eq!(restored.name, "Second");
        assert_eq!(store.list(Namespace::Backup).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_removes_both_slots() {
        let (service, store) = service();
        let s = session("Work");
        service.save(&s).unwrap();

        assert!(service.delete(&s.id).unwrap());
        assert!(store.get_raw(Namespace::Primary, &s.id).is_none());
        assert!(store.get_raw(Namespace::Backup, &s.id).is_none());
        assert!(!service.delete(&s.id).unwrap());
    }

    #[test]
    fn test_list_ids() {
        let (service, _) = service();
        let a = session("A");
        let b = session("B");
        service.save(&a).unwrap();
        service.save(&b).unwrap();

        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(service.list_ids().unwrap(), expected);
    }
}
