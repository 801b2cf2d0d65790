//! Project key resolution.
//!
//! A workspace without a durable project file is keyed by an MD5 digest of
//! its root folder paths; once a project file exists, its path becomes the
//! key (and the store migrates any record held under the legacy digest,
//! see [`crate::store::HistoryStore::resolve_project_key`]).

use serde::{Deserialize, Serialize};

/// Identity of the workspace a history event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceIdent {
    /// Root folder paths of the workspace, in window order.
    #[serde(default)]
    pub folders: Vec<String>,
    /// Durable project-file path, when the host environment has one.
    /// Strictly preferred over the folder digest.
    #[serde(default)]
    pub project_file: Option<String>,
}

impl WorkspaceIdent {
    pub fn from_folders(folders: impl IntoIterator<Item = impl Into<String>>) -> Self {
        WorkspaceIdent {
            folders: folders.into_iter().map(Into::into).collect(),
            project_file: None,
        }
    }
}

/// Digest-based key for workspaces without a project file: MD5 over the
/// concatenated folder paths.
pub fn hashed_key(folders: &[String]) -> String {
    let mut context = md5::Context::new();
    for folder in folders {
        context.consume(folder.as_bytes());
    }
    format!("{:x}", context.compute())
}
