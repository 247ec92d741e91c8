//! Schema migration for raw session records.
//!
//! Records are upgraded one version at a time on the raw JSON value, before
//! validation and typed deserialization. A record without a `version` field
//! predates versioning and is treated as version 1.
//!
//! | Version | Change                                                      |
//! |---------|-------------------------------------------------------------|
//! | 1 → 2   | single `folder_path` folded into `folder_paths`             |
//! | 2 → 3   | open files: `path` → `file_path`, `cursor_position: [l, c]` → `cursor`, `scroll_offset` → `scroll` |

use log::{debug, warn};
use serde_json::{json, Map, Value};

/// Version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Schema version of a raw record.
pub fn schema_version(record: &Value) -> u32 {
    record
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(1)
}

/// Upgrade `record` to [`CURRENT_SCHEMA_VERSION`].
///
/// Non-object values and records from a newer schema are returned unchanged.
pub fn migrate(mut record: Value) -> Value {
    let mut version = schema_version(&record);
    if version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Session record has schema version {} (newer than {}), leaving it as is",
            version, CURRENT_SCHEMA_VERSION
        );
        return record;
    }
    if let Some(fields) = record.as_object_mut() {
        while version < CURRENT_SCHEMA_VERSION {
            match version {
                1 => v1_to_v2(fields),
                2 => v2_to_v3(fields),
                _ => {}
            }
            version += 1;
            fields.insert("version".to_string(), json!(version));
            debug!("Migrated session record to schema version {}", version);
        }
    }
    record
}

fn v1_to_v2(fields: &mut Map<String, Value>) {
    if !fields.contains_key("last_accessed") {
        if let Some(timestamp) = fields.get("timestamp").cloned() {
            fields.insert("last_accessed".to_string(), timestamp);
        }
    }

    let Some(legacy) = fields.remove("folder_path") else {
        return;
    };
    let Some(folder) = legacy
        .as_str()
        .filter(|f| !f.is_empty())
        .map(str::to_string)
    else {
        return;
    };
    // Nothing to fold into; keep the legacy value rather than lose it.
    if !fields.get("folder_paths").map_or(true, Value::is_array) {
        fields.insert("folder_path".to_string(), legacy);
        return;
    }

    let folders = fields
        .entry("folder_paths")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(list) = folders.as_array_mut() {
        if !list.iter().any(|v| v.as_str() == Some(folder.as_str())) {
            list.insert(0, Value::String(folder));
        }
    }
}

fn v2_to_v3(fields: &mut Map<String, Value>) {
    let Some(files) = fields.get_mut("open_files").and_then(Value::as_array_mut) else {
        return;
    };
    for file in files.iter_mut().filter_map(Value::as_object_mut) {
        if let Some(path) = file.remove("path") {
            file.entry("file_path").or_insert(path);
        }

        if let Some(old) = file.remove("cursor_position") {
            let part = |i: usize| {
                old.as_array()
                    .and_then(|pair| pair.get(i))
                    .and_then(Value::as_u64)
                    .unwrap_or(0)
            };
            file.entry("cursor")
                .or_insert_with(|| json!({ "line": part(0), "column": part(1) }));
        }

        if let Some(old) = file.remove("scroll_offset") {
            let top = old.as_f64().unwrap_or(0.0);
            file.entry("scroll")
                .or_insert_with(|| json!({ "top": top, "left": 0.0 }));
        }
    }
}
