//! Path suppression rules for history tracking.
//!
//! Paths are tested in forward-slash form against the configured exclude
//! patterns; a matching re-include pattern cancels the exclusion. Patterns
//! are regular expressions applied as substring searches, not full matches.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Per-context pattern additions, appended after the globally configured
/// lists (e.g. from a view- or window-scoped settings blob).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuppressionOverrides {
    #[serde(default)]
    pub path_exclude_patterns: Vec<String>,
    #[serde(default)]
    pub path_reinclude_patterns: Vec<String>,
}

/// Compiled suppression patterns.
///
/// Built once from settings; invalid patterns are skipped with a warning
/// rather than poisoning the whole list.
#[derive(Debug, Default)]
pub struct SuppressionFilter {
    exclude: Vec<Regex>,
    reinclude: Vec<Regex>,
}

impl SuppressionFilter {
    pub fn new(exclude: &[String], reinclude: &[String]) -> Self {
        SuppressionFilter {
            exclude: compile_patterns(exclude),
            reinclude: compile_patterns(reinclude),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.path_exclude_patterns,
            &settings.path_reinclude_patterns,
        )
    }

    /// Whether `path` must be excluded from tracking.
    pub fn is_suppressed(&self, path: &str) -> bool {
        self.is_suppressed_with(path, None)
    }

    /// Like [`is_suppressed`](Self::is_suppressed), with context-specific
    /// pattern additions appended after the global lists.
    pub fn is_suppressed_with(&self, path: &str, overrides: Option<&SuppressionOverrides>) -> bool {
        let filename = normalize_slashes(path);

        let extra_exclude = overrides.map(|o| compile_patterns(&o.path_exclude_patterns));
        let excluded = self
            .exclude
            .iter()
            .chain(extra_exclude.iter().flatten())
            .find(|pattern| pattern.is_match(&filename));
        let Some(pattern) = excluded else {
            return false;
        };
        tracing::debug!(
            pattern = %pattern,
            file = %filename,
            "exclusion pattern blocks history tracking"
        );

        let extra_reinclude = overrides.map(|o| compile_patterns(&o.path_reinclude_patterns));
        let reincluded = self
            .reinclude
            .iter()
            .chain(extra_reinclude.iter().flatten())
            .find(|pattern| pattern.is_match(&filename));
        if let Some(pattern) = reincluded {
            tracing::debug!(
                pattern = %pattern,
                file = %filename,
                "inclusion pattern re-includes history tracking"
            );
            return false;
        }

        true
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "skipping invalid pattern");
                None
            }
        })
        .collect()
}

/// Forces forward slashes so patterns behave the same on every platform.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}
