//! Core data types for the history store.
//!
//! Field names on [`Entry`] and [`ProjectRecord`] are the persisted JSON
//! member names; changing them is a history-file format change.

use serde::{Deserialize, Serialize};

/// Key of the aggregate record that mirrors every project-scoped insert.
pub const GLOBAL_KEY: &str = "global";

/// Sentinel for an unknown pane or tab index.
pub const UNKNOWN_POSITION: i32 = -1;

fn unknown_position() -> i32 {
    UNKNOWN_POSITION
}

/// One recorded file access.
///
/// Identity within a bucket is `filename`: two entries with the same path
/// never coexist in one bucket. Entries are replaced (moved to the front)
/// or deleted, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Absolute, normalized path of the file.
    pub filename: String,
    /// Pane (window group) the file occupied, `-1` if unknown.
    #[serde(default = "unknown_position")]
    pub group: i32,
    /// Tab index within the pane, `-1` if unknown.
    #[serde(default = "unknown_position")]
    pub index: i32,
    /// Epoch seconds of the recorded access.
    #[serde(default)]
    pub timestamp: i64,
}

impl Entry {
    pub fn new(filename: impl Into<String>, group: i32, index: i32, timestamp: i64) -> Self {
        Entry {
            filename: filename.into(),
            group,
            index,
            timestamp,
        }
    }
}

/// Which of the two per-project buckets an access lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Opened,
    Closed,
}

impl BucketKind {
    pub const ALL: [BucketKind; 2] = [BucketKind::Opened, BucketKind::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            BucketKind::Opened => "opened",
            BucketKind::Closed => "closed",
        }
    }
}

/// The two bounded, most-recent-first buckets kept per project key.
///
/// A record always carries both buckets, possibly empty; serde defaults
/// keep that invariant for hand-edited history files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub opened: Vec<Entry>,
    #[serde(default)]
    pub closed: Vec<Entry>,
}

impl ProjectRecord {
    pub fn bucket(&self, kind: BucketKind) -> &Vec<Entry> {
        match kind {
            BucketKind::Opened => &self.opened,
            BucketKind::Closed => &self.closed,
        }
    }

    pub fn bucket_mut(&mut self, kind: BucketKind) -> &mut Vec<Entry> {
        match kind {
            BucketKind::Opened => &mut self.opened,
            BucketKind::Closed => &mut self.closed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }
}
