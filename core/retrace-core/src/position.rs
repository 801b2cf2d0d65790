//! Pane and tab-index resolution for reopened files.
//!
//! Pure given its inputs; used both when reopening an entry from history
//! and when promoting a preview to a permanent tab.

use crate::settings::NewTabPosition;

/// Current window geometry: the number of tabs in each pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaneLayout {
    pub tabs_per_pane: Vec<usize>,
}

impl PaneLayout {
    pub fn new(tabs_per_pane: impl Into<Vec<usize>>) -> Self {
        PaneLayout {
            tabs_per_pane: tabs_per_pane.into(),
        }
    }

    pub fn pane_count(&self) -> usize {
        self.tabs_per_pane.len()
    }

    /// Highest index a new tab can take in `pane` (appending after the
    /// last existing tab).
    pub fn max_index(&self, pane: usize) -> usize {
        self.tabs_per_pane.get(pane).copied().unwrap_or(0)
    }
}

/// Where the browse interaction was started from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallingPosition {
    pub pane: usize,
    pub index: usize,
}

/// Computes where a reopened file should land.
///
/// The saved pane wins while it still exists; the saved index wins while
/// `use_saved_position` is set and it still fits the target pane
/// (`saved_index == max_index` appends and is valid, including the empty
/// pane where both are zero). Otherwise the configured `policy` decides,
/// defaulting to the slot after the calling tab.
pub fn resolve_position(
    saved_pane: i32,
    saved_index: i32,
    layout: &PaneLayout,
    calling: Option<CallingPosition>,
    use_saved_position: bool,
    policy: NewTabPosition,
) -> (usize, usize) {
    let pane = if saved_pane >= 0 && (saved_pane as usize) < layout.pane_count() {
        saved_pane as usize
    } else {
        calling.map(|c| c.pane).unwrap_or(0)
    };

    let max_index = layout.max_index(pane);
    let index = if use_saved_position && saved_index >= 0 && saved_index as usize <= max_index {
        saved_index as usize
    } else {
        match policy {
            NewTabPosition::First => 0,
            NewTabPosition::Last => max_index,
            NewTabPosition::Next => calling.map(|c| c.index + 1).unwrap_or(0),
        }
    };

    (pane, index)
}
