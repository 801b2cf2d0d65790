//! The in-memory history store and its mutating operations.

use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::project::{self, WorkspaceIdent};
use crate::settings::Settings;
use crate::suppress::{SuppressionFilter, SuppressionOverrides};
use crate::tasks::{Task, TaskQueue};
use crate::timestamp;
use crate::types::{BucketKind, Entry, ProjectRecord, GLOBAL_KEY};

use super::persist;

/// Legacy digest-shaped project keys; these can never be probed for
/// existence on disk, so orphan cleanup must leave them alone.
static RE_HASHED_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{32}$").unwrap());

/// Mapping from project key to its two bounded buckets, backed by a JSON
/// file. Constructed once by the embedding application and passed into
/// every component that needs it; there is no process-wide instance.
///
/// Create with [`HistoryStore::open`] to read the backing file, or
/// [`HistoryStore::new_in_memory`] for tests.
pub struct HistoryStore {
    history: BTreeMap<String, ProjectRecord>,
    history_file: Option<PathBuf>,
    settings: Settings,
    filter: SuppressionFilter,
    load_error: Option<String>,
}

impl HistoryStore {
    pub fn new_in_memory(settings: Settings) -> Self {
        HistoryStore {
            history: BTreeMap::new(),
            history_file: None,
            filter: SuppressionFilter::from_settings(&settings),
            settings,
            load_error: None,
        }
    }

    /// Reads the history file, applying one-time format migrations.
    ///
    /// Never fails: a missing file yields an empty store, a corrupt one
    /// yields an empty store with [`load_error`](Self::load_error) set for
    /// the host to surface. If a migration touched data the migrated form
    /// is persisted immediately.
    pub fn open(settings: Settings, history_file: PathBuf, queue: &mut TaskQueue) -> Self {
        let outcome = persist::load(&history_file, &settings.timestamp_format);
        let mut store = HistoryStore {
            history: outcome.history,
            history_file: Some(history_file),
            filter: SuppressionFilter::from_settings(&settings),
            settings,
            load_error: outcome.error.map(|err| err.to_string()),
        };
        if outcome.migrated {
            if let Err(err) = store.save(queue) {
                tracing::warn!(error = %err, "failed to persist migrated history");
            }
        }
        store
    }

    /// The load failure to surface to the user, if the backing file was
    /// unreadable or corrupt.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applies a reloaded configuration (explicit reload entry point; the
    /// host calls this when its settings change).
    pub fn update_settings(&mut self, settings: Settings) {
        self.filter = SuppressionFilter::from_settings(&settings);
        self.settings = settings;
    }

    /// Enqueues the configured startup maintenance, if any.
    pub fn schedule_startup_maintenance(&self, queue: &mut TaskQueue) {
        if self.settings.delete_all_on_startup {
            queue.schedule(Task::ClearAll);
        } else if self.settings.cleanup_on_startup {
            queue.schedule(Task::PruneAll {
                drop_orphans: false,
            });
        }
    }

    /// Resolves the store key for a workspace, migrating any record held
    /// under the legacy folder digest once a durable project file appears.
    /// Idempotent: repeated calls with the same identity never duplicate
    /// entries.
    pub fn resolve_project_key(&mut self, workspace: &WorkspaceIdent) -> String {
        let hashed = project::hashed_key(&workspace.folders);
        let Some(project_file) = workspace.project_file.as_deref() else {
            return hashed;
        };

        if let Some(record) = self.history.remove(&hashed) {
            match self.history.entry(project_file.to_string()) {
                MapEntry::Vacant(slot) => {
                    tracing::debug!(
                        from = %hashed,
                        to = %project_file,
                        "migrating history record to durable project key"
                    );
                    slot.insert(record);
                }
                MapEntry::Occupied(_) => {
                    tracing::debug!(
                        project = %project_file,
                        "durable key already tracked; dropping legacy digest record"
                    );
                }
            }
        }

        project_file.to_string()
    }

    /// Records a file access in the named bucket of `project_key`, and
    /// mirrors it into the `"global"` record.
    ///
    /// Suppressed paths are skipped entirely. Paths that no longer exist
    /// on disk are purged from both the project and global records
    /// instead. Persists on every mutation.
    pub fn record_access(
        &mut self,
        project_key: &str,
        kind: BucketKind,
        path: &str,
        group: i32,
        index: i32,
        overrides: Option<&SuppressionOverrides>,
        queue: &mut TaskQueue,
    ) -> Result<()> {
        if self.filter.is_suppressed_with(path, overrides) {
            return Ok(());
        }

        if !Path::new(path).exists() {
            tracing::debug!(file = %path, "file no longer exists; purging stale entries");
            self.remove_entry(project_key, path);
            self.remove_entry(GLOBAL_KEY, path);
            return self.save(queue);
        }

        tracing::debug!(
            bucket = kind.as_str(),
            project = %project_key,
            group,
            index,
            file = %path,
            "recording access"
        );
        let timestamp = timestamp::now_epoch();
        self.insert_entry(project_key, kind, Entry::new(path, group, index, timestamp));
        self.insert_entry(GLOBAL_KEY, kind, Entry::new(path, group, index, timestamp));
        self.save(queue)
    }

    /// Returns a copy of both buckets for `project_key`. Mutating the
    /// returned record never affects the store. Unknown keys yield empty
    /// buckets.
    pub fn query(&self, project_key: &str) -> ProjectRecord {
        match self.history.get(project_key) {
            Some(record) => record.clone(),
            None => {
                tracing::warn!(
                    project = %project_key,
                    "project not found in the file history; returning an empty history"
                );
                ProjectRecord::default()
            }
        }
    }

    /// Deletes any entry for `path` from both buckets of `project_key`.
    /// Idempotent. Persists.
    pub fn remove(&mut self, project_key: &str, path: &str, queue: &mut TaskQueue) -> Result<()> {
        self.remove_entry(project_key, path);
        self.save(queue)
    }

    /// Removes entries whose file no longer exists from both buckets of
    /// `project_key`, then persists.
    pub fn prune(&mut self, project_key: &str, queue: &mut TaskQueue) -> Result<()> {
        self.prune_project(project_key);
        self.save(queue)
    }

    /// Prunes every known project. With `drop_orphans`, project-file keys
    /// whose file has vanished are dropped wholesale instead of pruned
    /// entry by entry; digest keys and `"global"` are always pruned, never
    /// dropped.
    pub fn prune_all(&mut self, drop_orphans: bool, queue: &mut TaskQueue) -> Result<()> {
        let keys: Vec<String> = self.history.keys().cloned().collect();
        for key in keys {
            if drop_orphans && is_orphaned_project_key(&key) {
                tracing::debug!(project = %key, "removing orphaned project from the history");
                self.history.remove(&key);
            } else {
                self.prune_project(&key);
            }
        }
        self.save(queue)
    }

    /// Discards the entire store and persists the empty result. This is
    /// the explicit user-invoked reset, distinct from pruning.
    pub fn clear_all(&mut self, queue: &mut TaskQueue) -> Result<()> {
        self.history.clear();
        self.save(queue)
    }

    /// Serializes the store to the backing file and schedules backup
    /// rotation. In-memory stores save nowhere.
    pub fn save(&mut self, queue: &mut TaskQueue) -> Result<()> {
        let Some(path) = &self.history_file else {
            return Ok(());
        };
        persist::save(path, &self.history, self.settings.prettify_history)?;
        queue.schedule(Task::RotateBackups {
            history_file: path.clone(),
            keep: self.settings.max_backup_count.max(0) as usize,
        });
        Ok(())
    }

    /// Removes `path` from both buckets of one project without persisting.
    /// Callers batch removals and save once.
    pub(crate) fn remove_entry(&mut self, project_key: &str, path: &str) {
        let Some(record) = self.history.get_mut(project_key) else {
            return;
        };
        for kind in BucketKind::ALL {
            record.bucket_mut(kind).retain(|entry| entry.filename != path);
        }
    }

    fn insert_entry(&mut self, project_key: &str, kind: BucketKind, entry: Entry) {
        let cap = if project_key == GLOBAL_KEY {
            self.settings.global_max_entries
        } else {
            self.settings.project_max_entries
        };
        let record = self.history.entry(project_key.to_string()).or_default();
        let bucket = record.bucket_mut(kind);
        bucket.retain(|existing| existing.filename != entry.filename);
        bucket.insert(0, entry);
        bucket.truncate(cap);
    }

    fn prune_project(&mut self, project_key: &str) {
        let Some(record) = self.history.get_mut(project_key) else {
            tracing::debug!(project = %project_key, "no history to prune");
            return;
        };
        for kind in BucketKind::ALL {
            record.bucket_mut(kind).retain(|entry| {
                let keep = Path::new(&entry.filename).exists();
                if !keep {
                    tracing::debug!(
                        project = %project_key,
                        file = %entry.filename,
                        "removing non-existent file"
                    );
                }
                keep
            });
        }
    }

    #[cfg(test)]
    pub(crate) fn contains_project(&self, project_key: &str) -> bool {
        self.history.contains_key(project_key)
    }
}

fn is_orphaned_project_key(key: &str) -> bool {
    if key == GLOBAL_KEY || RE_HASHED_KEY.is_match(key) {
        return false;
    }
    Path::new(key).is_absolute() && !Path::new(key).exists()
}
