//! Load/save of the history file, with one-time format migrations.
//!
//! # File Format
//!
//! ```json
//! {
//!   "global":  { "opened": [Entry...], "closed": [Entry...] },
//!   "<key>":   { "opened": [Entry...], "closed": [Entry...] }
//! }
//! ```
//!
//! # Defensive Design
//!
//! The file is user-reachable and written by older plugin generations, so
//! loading handles:
//! - Missing files (empty store)
//! - Empty files (empty store)
//! - Corrupt JSON (empty store, error recorded for the host to surface)
//! - Legacy shapes, via a migration chain of pure, individually testable
//!   steps over the raw JSON value
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a crash mid-save never truncates history.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use fs_err as fs;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{HistoryError, Result};
use crate::timestamp;
use crate::types::{ProjectRecord, GLOBAL_KEY};

/// Result of reading the history file.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub history: BTreeMap<String, ProjectRecord>,
    /// A migration step touched data; the caller persists immediately.
    pub migrated: bool,
    /// Load failure for the host to surface. The store itself falls back
    /// to empty and keeps running.
    pub error: Option<HistoryError>,
}

impl LoadOutcome {
    fn failed(error: HistoryError) -> Self {
        LoadOutcome {
            error: Some(error),
            ..LoadOutcome::default()
        }
    }
}

pub fn load(path: &Path, timestamp_format: &str) -> LoadOutcome {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "history file does not exist");
        return LoadOutcome::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::error!(error = %err, "failed to read history file");
            return LoadOutcome::failed(HistoryError::Io {
                context: format!("reading {}", path.display()),
                source: err,
            });
        }
    };

    if content.trim().is_empty() {
        tracing::warn!(path = %path.display(), "history file is empty");
        return LoadOutcome::default();
    }

    let mut value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, path = %path.display(), "history file is not valid JSON");
            return LoadOutcome::failed(HistoryError::Corrupt {
                path: path.to_path_buf(),
                details: err.to_string(),
            });
        }
    };

    let mut migrated = migrate_legacy_timestamps(&mut value, timestamp_format);
    migrated |= strip_action_tags(&mut value);

    match serde_json::from_value::<BTreeMap<String, ProjectRecord>>(value) {
        Ok(mut history) => {
            history.entry(GLOBAL_KEY.to_string()).or_default();
            LoadOutcome {
                history,
                migrated,
                error: None,
            }
        }
        Err(err) => {
            tracing::error!(error = %err, path = %path.display(), "history file has an unexpected shape");
            LoadOutcome::failed(HistoryError::Corrupt {
                path: path.to_path_buf(),
                details: err.to_string(),
            })
        }
    }
}

pub fn save(path: &Path, history: &BTreeMap<String, ProjectRecord>, pretty: bool) -> Result<()> {
    tracing::debug!(path = %path.display(), "saving history");

    let content = if pretty {
        serde_json::to_string_pretty(history)
    } else {
        serde_json::to_string(history)
    }
    .map_err(|err| HistoryError::Json {
        context: "serializing history".to_string(),
        source: err,
    })?;

    let parent = path.parent().ok_or_else(|| HistoryError::Io {
        context: format!("history file {} has no parent directory", path.display()),
        source: std::io::Error::from(std::io::ErrorKind::InvalidInput),
    })?;
    fs::create_dir_all(parent).map_err(|err| HistoryError::Io {
        context: format!("creating {}", parent.display()),
        source: err,
    })?;

    let io_context = |what: &str| format!("{what} for {}", path.display());
    let mut temp = NamedTempFile::new_in(parent).map_err(|err| HistoryError::Io {
        context: io_context("creating temp file"),
        source: err,
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|err| HistoryError::Io {
            context: io_context("writing temp file"),
            source: err,
        })?;
    temp.flush().map_err(|err| HistoryError::Io {
        context: io_context("flushing temp file"),
        source: err,
    })?;
    temp.persist(path).map_err(|err| HistoryError::Io {
        context: io_context("replacing history file"),
        source: err.error,
    })?;

    Ok(())
}

/// Migration: reparse human-formatted string timestamps as epoch seconds.
///
/// Entries whose timestamp matches none of the candidate formats are
/// dropped. Returns whether anything changed.
pub(crate) fn migrate_legacy_timestamps(root: &mut Value, configured_format: &str) -> bool {
    let mut touched = false;
    for_each_bucket(root, |entries| {
        entries.retain_mut(|entry| {
            let Some(raw) = entry.get("timestamp").and_then(Value::as_str).map(str::to_owned)
            else {
                return true;
            };
            touched = true;
            match timestamp::parse_legacy(&raw, configured_format) {
                Some(epoch) => {
                    entry["timestamp"] = Value::from(epoch);
                    true
                }
                None => {
                    tracing::debug!(
                        timestamp = %raw,
                        "dropping entry with unparseable legacy timestamp"
                    );
                    false
                }
            }
        });
    });
    touched
}

/// Migration: remove the legacy per-entry `action` tag.
pub(crate) fn strip_action_tags(root: &mut Value) -> bool {
    let mut touched = false;
    for_each_bucket(root, |entries| {
        for entry in entries.iter_mut() {
            if let Some(fields) = entry.as_object_mut() {
                if fields.remove("action").is_some() {
                    touched = true;
                }
            }
        }
    });
    touched
}

fn for_each_bucket(root: &mut Value, mut visit: impl FnMut(&mut Vec<Value>)) {
    let Some(projects) = root.as_object_mut() else {
        return;
    };
    for record in projects.values_mut() {
        for bucket in ["opened", "closed"] {
            if let Some(entries) = record.get_mut(bucket).and_then(Value::as_array_mut) {
                visit(entries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::timestamp::DEFAULT_FORMAT;
    use crate::types::Entry;

    fn store_with_one_entry() -> BTreeMap<String, ProjectRecord> {
        let mut history = BTreeMap::new();
        history.insert(
            "global".to_string(),
            ProjectRecord {
                opened: vec![Entry::new("/x/a.py", 0, 1, 1700000000)],
                closed: Vec::new(),
            },
        );
        history
    }

    #[test]
    fn round_trip_preserves_store() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        let history = store_with_one_entry();

        save(&path, &history, false).unwrap();
        let outcome = load(&path, DEFAULT_FORMAT);

        assert!(outcome.error.is_none());
        assert!(!outcome.migrated, "no migration expected for current schema");
        assert_eq!(outcome.history, history);
    }

    #[test]
    fn round_trip_pretty_printed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        let history = store_with_one_entry();

        save(&path, &history, true).unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains('\n'), "pretty output should be indented");
        assert_eq!(load(&path, DEFAULT_FORMAT).history, history);
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let outcome = load(&temp.path().join("nope.json"), DEFAULT_FORMAT);
        assert!(outcome.history.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn empty_file_loads_empty_without_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, "").unwrap();
        let outcome = load(&path, DEFAULT_FORMAT);
        assert!(outcome.history.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn corrupt_file_records_error_and_loads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, "{definitely not json").unwrap();
        let outcome = load(&path, DEFAULT_FORMAT);
        assert!(outcome.history.is_empty());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn load_ensures_global_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(&path, r#"{"abc123": {"opened": [], "closed": []}}"#).unwrap();
        let outcome = load(&path, DEFAULT_FORMAT);
        assert!(outcome.history.contains_key("global"));
    }

    #[test]
    fn migrates_string_timestamps_to_epoch() {
        let mut value = json!({
            "global": {
                "opened": [
                    {"filename": "/a", "group": 0, "index": 0, "timestamp": "2020-01-02 @ 03:04:05"}
                ],
                "closed": []
            }
        });
        assert!(migrate_legacy_timestamps(&mut value, DEFAULT_FORMAT));
        let migrated = &value["global"]["opened"][0]["timestamp"];
        assert!(migrated.is_i64());
    }

    #[test]
    fn drops_entries_with_unparseable_timestamps() {
        let mut value = json!({
            "global": {
                "opened": [
                    {"filename": "/a", "timestamp": "garbage"},
                    {"filename": "/b", "timestamp": "2020-01-02 03:04:05"}
                ],
                "closed": []
            }
        });
        assert!(migrate_legacy_timestamps(&mut value, DEFAULT_FORMAT));
        let opened = value["global"]["opened"].as_array().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0]["filename"], "/b");
    }

    #[test]
    fn epoch_timestamps_are_left_alone() {
        let mut value = json!({
            "global": {"opened": [{"filename": "/a", "timestamp": 1700000000}], "closed": []}
        });
        assert!(!migrate_legacy_timestamps(&mut value, DEFAULT_FORMAT));
    }

    #[test]
    fn strips_legacy_action_tags() {
        let mut value = json!({
            "global": {
                "opened": [{"filename": "/a", "timestamp": 1, "action": "opened"}],
                "closed": []
            }
        });
        assert!(strip_action_tags(&mut value));
        assert!(value["global"]["opened"][0].get("action").is_none());
        assert!(!strip_action_tags(&mut value), "second pass is a no-op");
    }

    #[test]
    fn full_load_migrates_and_flags_persistence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.json");
        std::fs::write(
            &path,
            r#"{
                "global": {
                    "opened": [{"filename": "/a", "group": 0, "index": 0,
                                "timestamp": "2020-01-02 @ 03:04:05", "action": "opened"}],
                    "closed": []
                }
            }"#,
        )
        .unwrap();

        let outcome = load(&path, DEFAULT_FORMAT);
        assert!(outcome.migrated);
        let entry = &outcome.history["global"].opened[0];
        assert!(entry.timestamp > 0);

        // persisting the migrated form makes the next load clean
        save(&path, &outcome.history, false).unwrap();
        let second = load(&path, DEFAULT_FORMAT);
        assert!(!second.migrated);
        assert_eq!(second.history, outcome.history);
    }
}
