//! Browse-session state machine for previewing and reopening entries.
//!
//! One session exists per window while the user browses history:
//!
//! ```text
//! IDLE → BROWSING → (PREVIEWING ⇄ BROWSING) → COMMITTED | CANCELLED → IDLE
//! ```
//!
//! The editor itself stays behind the [`Workbench`] trait; the session
//! only tracks which entry is under preview, where the interaction was
//! started from, and which deletions are owed a persist. Operations that
//! reference a vanished file degrade to removal-from-history; operations
//! invoked without an active preview are silent no-ops.

use std::path::Path;

use crate::error::Result;
use crate::position::{resolve_position, CallingPosition, PaneLayout};
use crate::settings::Settings;
use crate::store::HistoryStore;
use crate::tasks::{Task, TaskQueue};
use crate::types::{BucketKind, Entry, GLOBAL_KEY};

/// Opaque handle to an editor view.
pub type ViewId = u64;

/// The host editor surface the session drives.
///
/// Implemented by the editor adapter; tests use an in-memory fake. A
/// *transient* view is the disposable preview slot; promoting it to a
/// permanent tab is the editor's normal "open file" operation.
pub trait Workbench {
    fn active_view(&self) -> Option<ViewId>;
    /// Total number of tabs across all panes.
    fn view_count(&self) -> usize;
    fn pane_count(&self) -> usize;
    fn tabs_in_pane(&self, pane: usize) -> usize;
    /// `(pane, index)` of a view, when it still exists.
    fn view_position(&self, view: ViewId) -> Option<(usize, usize)>;
    /// A permanent view of `path` in any pane other than `pane`.
    fn find_view_in_other_pane(&self, path: &str, pane: usize) -> Option<ViewId>;
    fn open_transient(&mut self, path: &str) -> ViewId;
    fn open_permanent(&mut self, path: &str) -> ViewId;
    fn set_view_position(&mut self, view: ViewId, pane: usize, index: usize);
    fn is_transient(&self, view: ViewId) -> bool;
    fn focus_view(&mut self, view: ViewId);
    fn close_view(&mut self, view: ViewId);
}

/// Where the browse command was invoked from. Needed to restore focus on
/// cancel, and because "refocus the calling view" is impossible if the
/// window had no tabs.
#[derive(Debug, Clone, Default)]
struct CallingContext {
    view: Option<ViewId>,
    pane: usize,
    index: usize,
    window_was_empty: bool,
}

/// Ephemeral state of one browse interaction. Not persisted; created when
/// browsing starts and discarded on commit, cancel, or quick-open handoff.
pub struct BrowseSession {
    project_key: String,
    calling: Option<CallingContext>,
    current_entry: Option<Entry>,
    preview: Option<ViewId>,
    /// Paths whose store removal still needs persisting; drained as one
    /// batch when the interaction ends so the displayed list is never
    /// mutated mid-display.
    pending_deletes: Vec<String>,
    needs_refresh: bool,
}

impl BrowseSession {
    /// Starts browsing for `project_key` (a project key or
    /// [`GLOBAL_KEY`]), snapshotting the calling context.
    pub fn start(project_key: impl Into<String>, workbench: &dyn Workbench) -> Self {
        let mut session = BrowseSession {
            project_key: project_key.into(),
            calling: None,
            current_entry: None,
            preview: None,
            pending_deletes: Vec::new(),
            needs_refresh: false,
        };
        session.snapshot_context(workbench);
        session
    }

    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    pub fn current_entry(&self) -> Option<&Entry> {
        self.current_entry.as_ref()
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    /// Whether the caller should redisplay its list (an entry was deleted
    /// or focus moved to another pane).
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Highlights `entry`: records it as current and, when previews are
    /// enabled, schedules a transient view of it. Re-entrant; a later call
    /// simply replaces the current entry. If the file is already gone the
    /// preview is closed and the entry dropped from history instead.
    pub fn preview(
        &mut self,
        entry: &Entry,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) {
        self.current_entry = Some(entry.clone());
        // track the context even when previews are disabled, so quick-open
        // and delete-current still work
        self.snapshot_context(workbench);

        if !store.settings().show_file_preview {
            return;
        }

        if Path::new(&entry.filename).exists() {
            // opened asynchronously to keep the list responsive
            queue.schedule(Task::OpenPreview {
                path: entry.filename.clone(),
            });
        } else {
            self.handle_vanished_preview(&entry.filename, store, workbench, queue);
        }
    }

    /// Executes a scheduled preview. The path is re-checked here because
    /// the file may have vanished between scheduling and execution.
    pub(crate) fn complete_preview(
        &mut self,
        path: &str,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) {
        // the selection may have moved on while this task was queued
        if self.current_entry.as_ref().map(|e| e.filename.as_str()) != Some(path) {
            return;
        }

        if !Path::new(path).exists() {
            self.handle_vanished_preview(path, store, workbench, queue);
            return;
        }

        tracing::debug!(file = %path, "opening preview");
        if let Some(previous) = self.preview.take() {
            if workbench.is_transient(previous) {
                workbench.close_view(previous);
            }
        }
        self.preview = Some(workbench.open_transient(path));
    }

    /// Promotes the current preview into a permanent tab at its resolved
    /// position, unless the user already promoted it (then only focus
    /// bookkeeping remains). Ends the interaction and re-snapshots the
    /// calling context so a second browse starts fresh.
    ///
    /// Returns whether the caller must rebuild its list.
    pub fn quick_open(
        &mut self,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) -> Result<bool> {
        let Some(entry) = self.current_entry.clone() else {
            return Ok(false);
        };

        let mut needs_reopen = false;
        let promotable = self
            .preview
            .map(|view| workbench.is_transient(view))
            .unwrap_or(true);

        if promotable {
            let calling_pane = self.calling.as_ref().map(|c| c.pane).unwrap_or(0);
            if !Path::new(&entry.filename).exists() {
                self.close_preview(workbench);
                store.remove_entry(&self.project_key, &entry.filename);
                store.remove_entry(GLOBAL_KEY, &entry.filename);
                self.pending_deletes.push(entry.filename.clone());
            } else if let Some(existing) =
                workbench.find_view_in_other_pane(&entry.filename, calling_pane)
            {
                tracing::debug!(
                    file = %entry.filename,
                    "focusing existing view instead of opening a clone"
                );
                self.close_preview(workbench);
                workbench.focus_view(existing);
                // focus moved to another pane; the list must be rebuilt
                needs_reopen = true;
            } else {
                let (pane, index) = self.resolve_entry_position(&entry, workbench, store.settings());
                let view = workbench.open_permanent(&entry.filename);
                workbench.set_view_position(view, pane, index);
            }
        }

        self.finish(store, queue)?;
        self.snapshot_context(workbench);
        Ok(needs_reopen)
    }

    /// Removes the currently previewed entry from the project's history
    /// without closing the preview, and marks the interaction for
    /// refresh. The persist is deferred to the end of the interaction.
    pub fn delete_current(&mut self, store: &mut HistoryStore) {
        let Some(entry) = self.current_entry.clone() else {
            return;
        };
        tracing::debug!(
            file = %entry.filename,
            project = %self.project_key,
            "removing history entry"
        );
        store.remove_entry(&self.project_key, &entry.filename);
        self.pending_deletes.push(entry.filename);
        self.needs_refresh = true;
    }

    /// Opens `entry` as a permanent tab at its resolved position and
    /// records it as a fresh `opened` access. Ends the interaction.
    pub fn commit(
        &mut self,
        entry: &Entry,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) -> Result<()> {
        self.snapshot_context(workbench);
        let calling_pane = self.calling.as_ref().map(|c| c.pane).unwrap_or(0);

        if let Some(existing) = workbench.find_view_in_other_pane(&entry.filename, calling_pane) {
            tracing::debug!(file = %entry.filename, "focusing existing view in another pane");
            self.close_preview(workbench);
            workbench.focus_view(existing);
        } else if Path::new(&entry.filename).exists() {
            let (pane, index) = self.resolve_entry_position(entry, workbench, store.settings());
            self.close_preview(workbench);
            let view = workbench.open_permanent(&entry.filename);
            workbench.set_view_position(view, pane, index);
            tracing::debug!(
                file = %entry.filename,
                pane,
                index,
                saved_pane = entry.group,
                saved_index = entry.index,
                "opened history entry"
            );
            store.record_access(
                &self.project_key,
                BucketKind::Opened,
                &entry.filename,
                pane as i32,
                index as i32,
                None,
                queue,
            )?;
        } else {
            // vanished underneath us: record_access purges the stale
            // entries and persists
            store.record_access(
                &self.project_key,
                BucketKind::Opened,
                &entry.filename,
                entry.group,
                entry.index,
                None,
                queue,
            )?;
        }

        self.finish(store, queue)
    }

    /// The user cancelled: close any open preview, give focus back to the
    /// calling view when one still exists, and end the interaction.
    pub fn cancel(
        &mut self,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) -> Result<()> {
        let window_was_empty = self
            .calling
            .as_ref()
            .map(|c| c.window_was_empty)
            .unwrap_or(true);

        if window_was_empty {
            // nothing to refocus; drop the preview tab itself
            if let Some(view) = self.preview.take() {
                workbench.close_view(view);
            }
        } else {
            self.close_preview(workbench);
            if let Some(view) = self.calling.as_ref().and_then(|c| c.view) {
                workbench.focus_view(view);
            }
        }

        self.finish(store, queue)
    }

    fn snapshot_context(&mut self, workbench: &dyn Workbench) {
        if self.calling.is_some() {
            return;
        }
        let context = match workbench.active_view() {
            Some(view) => {
                let (pane, index) = workbench.view_position(view).unwrap_or((0, 0));
                CallingContext {
                    view: Some(view),
                    pane,
                    index,
                    window_was_empty: workbench.view_count() == 0,
                }
            }
            None => CallingContext {
                view: None,
                pane: 0,
                index: 0,
                window_was_empty: true,
            },
        };
        self.calling = Some(context);
    }

    fn resolve_entry_position(
        &self,
        entry: &Entry,
        workbench: &dyn Workbench,
        settings: &Settings,
    ) -> (usize, usize) {
        let layout = PaneLayout::new(
            (0..workbench.pane_count())
                .map(|pane| workbench.tabs_in_pane(pane))
                .collect::<Vec<_>>(),
        );
        let calling = self.calling.as_ref().map(|c| CallingPosition {
            pane: c.pane,
            index: c.index,
        });
        resolve_position(
            entry.group,
            entry.index,
            &layout,
            calling,
            settings.use_saved_position,
            settings.new_tab_position,
        )
    }

    /// Closes the preview view, but only while it is still the active,
    /// still-transient view; a promoted or refocused preview is left
    /// alone.
    fn close_preview(&mut self, workbench: &mut dyn Workbench) {
        let Some(view) = self.preview else {
            return;
        };
        if workbench.active_view() != Some(view) {
            tracing::debug!("preview is no longer the active view; leaving it alone");
            return;
        }
        if !workbench.is_transient(view) {
            tracing::debug!("preview was promoted to a permanent tab; leaving it open");
            return;
        }
        workbench.close_view(view);
        self.preview = None;
    }

    fn handle_vanished_preview(
        &mut self,
        path: &str,
        store: &mut HistoryStore,
        workbench: &mut dyn Workbench,
        queue: &mut TaskQueue,
    ) {
        self.close_preview(workbench);
        if !store.settings().remove_non_existent_files_on_preview {
            return;
        }
        tracing::debug!(file = %path, "previewed file no longer exists; dropping from history");
        store.remove_entry(&self.project_key, path);
        store.remove_entry(GLOBAL_KEY, path);
        if let Err(err) = store.save(queue) {
            tracing::warn!(error = %err, "failed to persist stale-entry removal");
        }
        self.needs_refresh = true;
    }

    /// Ends the interaction: flushes deferred deletions in one persist and
    /// clears the session state.
    fn finish(&mut self, store: &mut HistoryStore, queue: &mut TaskQueue) -> Result<()> {
        let flush = if self.pending_deletes.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                count = self.pending_deletes.len(),
                "persisting deferred history deletions"
            );
            store.save(queue)
        };
        self.pending_deletes.clear();
        self.calling = None;
        self.current_entry = None;
        self.preview = None;
        self.needs_refresh = false;
        flush
    }
}
