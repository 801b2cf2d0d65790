//! Storage configuration and path management for Retrace.
//!
//! A single `StorageConfig` owns every path decision so that tests can
//! inject a temp root and production code never hardcodes `~/.retrace`.

use std::path::{Path, PathBuf};

/// Central configuration for all Retrace storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `~/.retrace/`. Tests use `StorageConfig::with_root(temp_dir)` for
/// isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Retrace data (default: ~/.retrace)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self {
            root: home.join(".retrace"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for Retrace data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to settings.json (recognized options, see [`crate::settings`]).
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Default path to the history file. A `history_file` setting
    /// overrides this, see [`crate::settings::Settings::history_path`].
    pub fn history_file(&self) -> PathBuf {
        self.root.join("history.json")
    }

    /// Ensures the root directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}
