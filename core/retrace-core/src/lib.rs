//! # retrace-core
//!
//! Core library for Retrace: a bounded, per-project history of the files a
//! user has opened and closed, with enough position data to reopen any
//! entry where it used to live.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Deferred work goes
//!   through an explicit [`tasks::TaskQueue`] the embedder drains.
//! - **Not thread-safe**: Clients provide their own synchronization.
//! - **Graceful degradation**: Corrupt files fall back to an empty store,
//!   vanished files drop out of history, stale session pointers are
//!   no-ops. Nothing here may take the host editor down.
//! - **No ambient state**: The store is constructed by the embedder and
//!   passed explicitly; the editor surface stays behind
//!   [`session::Workbench`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retrace_core::{HistoryStore, Settings, StorageConfig, TaskQueue};
//!
//! let storage = StorageConfig::default();
//! let settings = Settings::load(&storage.settings_file());
//! let mut queue = TaskQueue::new();
//! let mut store = HistoryStore::open(settings, storage.history_file(), &mut queue);
//! ```

pub mod error;
pub mod position;
pub mod project;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod suppress;
pub mod tasks;
pub mod timestamp;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{HistoryError, Result};
pub use position::{resolve_position, CallingPosition, PaneLayout};
pub use project::WorkspaceIdent;
pub use session::{BrowseSession, ViewId, Workbench};
pub use settings::{NewTabPosition, Settings, TimestampMode};
pub use storage::StorageConfig;
pub use store::HistoryStore;
pub use suppress::{SuppressionFilter, SuppressionOverrides};
pub use tasks::{run_pending, Task, TaskQueue};
pub use types::{BucketKind, Entry, ProjectRecord, GLOBAL_KEY};
