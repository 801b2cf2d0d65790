//! Dated backup rotation for the history file.
//!
//! After every save, a `RotateBackups` task copies the history file to a
//! sibling named `<stem>_<YYYYMMDD><ext>` (at most one per day) and prunes
//! the oldest backups beyond the retention count. Rotation failures are
//! logged, never propagated; the primary save has already succeeded.

use std::path::{Path, PathBuf};

use fs_err as fs;

/// Copies today's backup if missing and prunes beyond `keep`.
pub fn rotate(history_file: &Path, keep: usize) {
    // Only keep backups if the user wants them
    if keep == 0 {
        return;
    }
    let datestamp = chrono::Local::now().format("%Y%m%d").to_string();
    if let Err(err) = rotate_with_date(history_file, keep, &datestamp) {
        tracing::warn!(error = %err, "backup rotation failed");
    }
}

fn rotate_with_date(history_file: &Path, keep: usize, datestamp: &str) -> std::io::Result<()> {
    if !history_file.exists() {
        return Ok(());
    }

    let backup = backup_path(history_file, datestamp);
    if !backup.exists() {
        tracing::debug!(datestamp, "backing up the history file");
        fs::copy(history_file, &backup)?;
    }

    let mut backups = list_backups(history_file)?;
    backups.sort();
    backups.reverse();
    for discarded in backups.iter().skip(keep) {
        tracing::debug!(backup = %discarded.display(), "discarding old backup");
        fs::remove_file(discarded)?;
    }

    Ok(())
}

fn backup_path(history_file: &Path, datestamp: &str) -> PathBuf {
    let stem = history_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = extension_suffix(history_file);
    history_file.with_file_name(format!("{stem}_{datestamp}{ext}"))
}

/// Sibling files matching `<stem>_*<ext>`, sorted by name descending by
/// the caller (datestamps sort chronologically).
fn list_backups(history_file: &Path) -> std::io::Result<Vec<PathBuf>> {
    let parent = match history_file.parent() {
        Some(parent) => parent,
        None => return Ok(Vec::new()),
    };
    let stem = history_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{stem}_");
    let suffix = extension_suffix(history_file);

    let mut backups = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&prefix) && name.ends_with(&suffix) {
            backups.push(entry.path());
        }
    }
    Ok(backups)
}

fn extension_suffix(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}
