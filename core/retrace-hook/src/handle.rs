//! Event handling for host-editor hooks.
//!
//! Reads JSON from stdin, parses the event, and records it in the store.
//!
//! ## Events
//!
//! ```text
//! file_opened  → opened bucket
//! file_closing → closed bucket   (sent before the tab is gone, while
//!                                 pane and index are still known)
//! ```

use std::io::{self, Read};

use fs_err as fs;
use serde::Deserialize;

use retrace_core::types::UNKNOWN_POSITION;
use retrace_core::{
    run_pending, BucketKind, HistoryStore, Settings, StorageConfig, SuppressionOverrides,
    TaskQueue, WorkspaceIdent,
};

fn unknown_position() -> i32 {
    UNKNOWN_POSITION
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    FileOpened,
    FileClosing,
}

impl EventKind {
    fn bucket(self) -> BucketKind {
        match self {
            EventKind::FileOpened => BucketKind::Opened,
            EventKind::FileClosing => BucketKind::Closed,
        }
    }
}

/// One hook invocation's payload.
#[derive(Debug, Deserialize)]
pub struct HostEvent {
    pub event: EventKind,
    /// Absolute path of the affected file.
    pub path: String,
    #[serde(default = "unknown_position")]
    pub group: i32,
    #[serde(default = "unknown_position")]
    pub index: i32,
    /// Workspace roots of the window the event came from.
    #[serde(default)]
    pub folders: Vec<String>,
    /// Durable project-file path, when the editor has one.
    #[serde(default)]
    pub project_file: Option<String>,
    /// Per-view suppression pattern additions.
    #[serde(default)]
    pub overrides: Option<SuppressionOverrides>,
}

/// `handle` subcommand: reads one event from stdin.
pub fn run(settings: Settings, storage: &StorageConfig) -> Result<(), String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;

    if input.trim().is_empty() {
        return Ok(());
    }

    let event: HostEvent =
        serde_json::from_str(&input).map_err(|e| format!("Failed to parse hook event: {}", e))?;

    handle_event(event, settings, storage)
}

pub fn handle_event(
    event: HostEvent,
    settings: Settings,
    storage: &StorageConfig,
) -> Result<(), String> {
    let (mut store, mut queue) = open_store(settings, storage);

    let workspace = WorkspaceIdent {
        folders: event.folders.clone(),
        project_file: event.project_file.clone(),
    };
    let project_key = store.resolve_project_key(&workspace);
    let path = resolve_real_path(&event.path, store.settings().real_path);

    tracing::debug!(
        event = ?event.event,
        project = %project_key,
        file = %path,
        "handling editor event"
    );
    store
        .record_access(
            &project_key,
            event.event.bucket(),
            &path,
            event.group,
            event.index,
            event.overrides.as_ref(),
            &mut queue,
        )
        .map_err(String::from)?;

    run_pending(&mut queue, &mut store, None);
    Ok(())
}

/// `cleanup` subcommand.
pub fn run_cleanup(
    settings: Settings,
    storage: &StorageConfig,
    drop_orphans: bool,
) -> Result<(), String> {
    let (mut store, mut queue) = open_store(settings, storage);
    store
        .prune_all(drop_orphans, &mut queue)
        .map_err(String::from)?;
    run_pending(&mut queue, &mut store, None);
    Ok(())
}

/// `reset` subcommand.
pub fn run_reset(settings: Settings, storage: &StorageConfig) -> Result<(), String> {
    let (mut store, mut queue) = open_store(settings, storage);
    store.clear_all(&mut queue).map_err(String::from)?;
    run_pending(&mut queue, &mut store, None);
    Ok(())
}

fn open_store(settings: Settings, storage: &StorageConfig) -> (HistoryStore, TaskQueue) {
    let history_file = settings.history_path(storage);
    let mut queue = TaskQueue::new();
    let store = HistoryStore::open(settings, history_file, &mut queue);
    if let Some(error) = store.load_error() {
        tracing::error!(error = %error, "history could not be read; starting from an empty store");
    }
    (store, queue)
}

fn resolve_real_path(path: &str, real_path: bool) -> String {
    if !real_path {
        return path.to_string();
    }
    match fs::canonicalize(path) {
        Ok(resolved) => {
            let resolved = resolved.to_string_lossy().into_owned();
            if resolved != path {
                tracing::debug!(from = %path, to = %resolved, "resolved real path");
            }
            resolved
        }
        Err(_) => path.to_string(),
    }
}
