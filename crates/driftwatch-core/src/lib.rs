//! driftwatch core library — stateful polling file-system change detection.
//!
//! `driftwatch-core` re-scans a directory tree on each tick, diffs it
//! against an in-memory [`Store`] of previously observed entries, and
//! classifies every entry as created, deleted, changed or unchanged. It is
//! built for long-running processes that poll a tree (no OS notification
//! API involved) and want an incremental, idempotent change feed.
//!
//! The intended pattern: keep one [`Store`] per monitored root, call
//! [`scan`] each tick, and when the returned change count is non-zero,
//! drain the actionable records with [`get_changed`].
//!
//! # Modules
//!
//! - [`store`] — The snapshot store: entry records, fingerprints, directory
//!   aggregates and scan-control bookkeeping.
//! - [`scan`] — The scanner: walk, diff, mark-and-sweep deletion detection
//!   and statistics aggregation.
//! - [`query`] — Read and notification-drain operations over a store.
//! - [`project`] — Flat key/value project descriptor loader.
//! - [`error`] — Unified error type ([`WatchError`]) and result alias.
//!
//! A scan is pure stat-based polling: renames surface as one deletion plus
//! one creation, symlinks are reported with their own link status, and
//! nothing is ever persisted — a process restart starts from a cold scan.

pub mod error;
pub mod project;
pub mod query;
pub mod scan;
pub mod store;

pub use error::{WatchError, WatchResult};
pub use project::ProjectInfo;
pub use query::{
    count_entries, count_files, filter_by_age, filter_entries, filter_files, get_changed,
};
pub use scan::{scan, scan_at, ScanOptions};
pub use store::entry::{Children, DirRecord, DirStats, Entry, EntryMeta, FileRecord, Fingerprint};
pub use store::{FilterSignature, ScanControl, Store};
