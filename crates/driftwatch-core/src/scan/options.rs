//! Scan options.

use regex::Regex;

use crate::store::FilterSignature;

/// Options controlling one scan pass. All options are independent.
///
/// The defaults scan a single directory level, keep records for deleted
/// entries, and treat everything found on the first scan of a cold store
/// as pre-existing background rather than a change.
///
/// # Examples
///
/// ```
/// use driftwatch_core::ScanOptions;
/// use regex::Regex;
///
/// let opts = ScanOptions::new()
///     .name_filter(Regex::new(r"\.log$").unwrap())
///     .recursive(true);
/// assert!(opts.recursive);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Pattern tested against entry names; non-matching entries are
    /// skipped entirely for the pass.
    pub name_filter: Option<Regex>,
    /// Pattern tested against the entry's full path.
    pub path_filter: Option<Regex>,
    /// Recurse into subdirectories. When `false`, directories are neither
    /// recorded nor counted.
    pub recursive: bool,
    /// Purge entries that go missing instead of flagging them `deleted`.
    pub ignore_deleted: bool,
    /// Count and queue for notification the entries found on the very
    /// first scan of a cold store.
    pub notify_existing: bool,
}

impl ScanOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name filter.
    pub fn name_filter(mut self, pattern: Regex) -> Self {
        self.name_filter = Some(pattern);
        self
    }

    /// Sets the path filter.
    pub fn path_filter(mut self, pattern: Regex) -> Self {
        self.path_filter = Some(pattern);
        self
    }

    /// Enables or disables recursion into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Enables or disables purging of missing entries.
    pub fn ignore_deleted(mut self, ignore_deleted: bool) -> Self {
        self.ignore_deleted = ignore_deleted;
        self
    }

    /// Enables or disables first-scan notification of pre-existing entries.
    pub fn notify_existing(mut self, notify_existing: bool) -> Self {
        self.notify_existing = notify_existing;
        self
    }

    /// The filter signature these options imply.
    ///
    /// Stores remember the signature they were populated under; a mismatch
    /// on a later scan resets the store (see [`crate::scan::scan_at`]).
    pub fn signature(&self) -> FilterSignature {
        FilterSignature {
            name: self.name_filter.as_ref().map(|r| r.as_str().to_owned()),
            path: self.path_filter.as_ref().map(|r| r.as_str().to_owned()),
        }
    }
}
