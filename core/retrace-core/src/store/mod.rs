//! The persistent two-bucket history store.
//!
//! # Architecture
//!
//! ```text
//! host events → HistoryStore (in memory) → persist (JSON file) → backup
//!                    ↑ queries                    (atomic write)   (dated copies)
//!              browse session
//! ```
//!
//! Every mutation persists; deferred work (backup rotation, startup
//! maintenance) goes through [`crate::tasks::TaskQueue`] so it never runs
//! during a store mutation.
//!
//! # Module Structure
//!
//! - [`history`](self): [`HistoryStore`], the add/remove/query/prune
//!   operations and their invariants (dedup, caps, global mirroring)
//! - `persist`: file load/save, corruption fallback, format migrations
//! - `backup`: dated backup copies with retention

pub(crate) mod backup;
mod history;
mod persist;

pub use history::HistoryStore;
