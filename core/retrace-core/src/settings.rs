//! Runtime configuration for the history core.
//!
//! Settings live in a JSON file (see [`crate::storage::StorageConfig`]);
//! every field has a default so a missing or partial file still yields a
//! working configuration. Reloading is explicit: the host calls
//! [`Settings::load`] again and hands the result to
//! [`crate::store::HistoryStore::update_settings`].

use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::storage::StorageConfig;
use crate::timestamp;

/// Where a reopened file's tab lands when the saved index is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewTabPosition {
    First,
    Last,
    Next,
}

/// Which timestamp a history entry is displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    HistoryAccess,
    FileModified,
}

/// The recognized configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    /// Cap for the aggregate "global" buckets.
    pub global_max_entries: usize,
    /// Cap for each project-scoped bucket.
    pub project_max_entries: usize,
    pub use_saved_position: bool,
    pub new_tab_position: NewTabPosition,
    pub remove_non_existent_files_on_preview: bool,
    pub cleanup_on_startup: bool,
    pub delete_all_on_startup: bool,
    /// Override for the history file location; relative paths resolve
    /// against the storage root.
    pub history_file: Option<PathBuf>,
    /// Resolve symlinks before recording accesses.
    pub real_path: bool,
    pub monospace_font: bool,
    pub timestamp_show: bool,
    pub timestamp_format: String,
    pub timestamp_mode: TimestampMode,
    pub timestamp_relative: bool,
    pub prettify_history: bool,
    pub path_exclude_patterns: Vec<String>,
    pub path_reinclude_patterns: Vec<String>,
    /// Dated backups kept next to the history file; `<= 0` disables.
    pub max_backup_count: i64,
    pub show_file_preview: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debug: false,
            global_max_entries: 100,
            project_max_entries: 50,
            use_saved_position: true,
            new_tab_position: NewTabPosition::Next,
            remove_non_existent_files_on_preview: true,
            cleanup_on_startup: true,
            delete_all_on_startup: false,
            history_file: None,
            real_path: false,
            monospace_font: false,
            timestamp_show: true,
            timestamp_format: timestamp::DEFAULT_FORMAT.to_string(),
            timestamp_mode: TimestampMode::HistoryAccess,
            timestamp_relative: true,
            prettify_history: false,
            path_exclude_patterns: Vec::new(),
            path_reinclude_patterns: Vec::new(),
            max_backup_count: 3,
            show_file_preview: true,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults for a missing
    /// or malformed file. Never fails.
    pub fn load(path: &Path) -> Self {
        let mut settings = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        path = %path.display(),
                        "settings file malformed; using defaults"
                    );
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        };
        settings.validate();
        settings
    }

    /// Clamps invalid option values to usable ones.
    pub fn validate(&mut self) {
        if !timestamp::is_valid_format(&self.timestamp_format) {
            tracing::warn!(
                format = %self.timestamp_format,
                "invalid timestamp_format; falling back to default"
            );
            self.timestamp_format = timestamp::DEFAULT_FORMAT.to_string();
        }
    }

    /// Resolves the history file location, honoring the `history_file`
    /// override (relative paths join the storage root).
    pub fn history_path(&self, storage: &StorageConfig) -> PathBuf {
        match &self.history_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => storage.root().join(path),
            None => storage.history_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.global_max_entries, 100);
        assert_eq!(settings.project_max_entries, 50);
        assert!(settings.use_saved_position);
        assert_eq!(settings.new_tab_position, NewTabPosition::Next);
        assert!(settings.cleanup_on_startup);
        assert!(!settings.delete_all_on_startup);
        assert_eq!(settings.timestamp_format, timestamp::DEFAULT_FORMAT);
        assert_eq!(settings.timestamp_mode, TimestampMode::HistoryAccess);
        assert_eq!(settings.max_backup_count, 3);
        assert!(settings.show_file_preview);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(&temp.path().join("settings.json"));
        assert_eq!(settings.global_max_entries, 100);
    }

    #[test]
    fn load_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"project_max_entries": 5, "new_tab_position": "last"}"#)
            .unwrap();
        let settings = Settings::load(&path);
        assert_eq!(settings.project_max_entries, 5);
        assert_eq!(settings.new_tab_position, NewTabPosition::Last);
        assert_eq!(settings.global_max_entries, 100);
    }

    #[test]
    fn load_malformed_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let settings = Settings::load(&path);
        assert_eq!(settings.project_max_entries, 50);
    }

    #[test]
    fn invalid_timestamp_format_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"timestamp_format": "%Q!!"}"#).unwrap();
        let settings = Settings::load(&path);
        assert_eq!(settings.timestamp_format, timestamp::DEFAULT_FORMAT);
    }

    #[test]
    fn history_path_honors_override() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/retrace"));
        let mut settings = Settings::default();
        assert_eq!(
            settings.history_path(&storage),
            PathBuf::from("/tmp/retrace/history.json")
        );

        settings.history_file = Some(PathBuf::from("elsewhere/log.json"));
        assert_eq!(
            settings.history_path(&storage),
            PathBuf::from("/tmp/retrace/elsewhere/log.json")
        );

        settings.history_file = Some(PathBuf::from("/var/data/history.json"));
        assert_eq!(
            settings.history_path(&storage),
            PathBuf::from("/var/data/history.json")
        );
    }
}
