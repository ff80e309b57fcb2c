//! Snapshot entry records.
//!
//! The snapshot store is a tree of [`Entry`] values: a tagged union of
//! [`FileRecord`] and [`DirRecord`], keyed by name within each level. The
//! kind of an entry is fixed for its whole life — a path that changes kind
//! between scans gets a fresh record, never a mutated one.

use std::fs::Metadata;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;

/// One level of the snapshot tree: child name → child entry.
///
/// Iteration follows insertion order, which is what makes scan and query
/// traversals deterministic between passes.
pub type Children = IndexMap<String, Entry>;

/// The `(size, change-time, modify-time)` triple used to detect that a
/// file changed without reading its bytes.
///
/// The triple catches truncation (size), touch-without-write (ctime only)
/// and genuine modification (mtime). Change-time is the inode change time
/// on Unix and the creation time elsewhere, falling back to the modify
/// time when the platform reports neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// File size in bytes.
    pub size: u64,
    /// Change time (inode status change on Unix).
    pub ctime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl Fingerprint {
    /// Builds a fingerprint from file metadata.
    ///
    /// The metadata should come from a non-following stat call
    /// (`symlink_metadata`) so symlinks fingerprint as themselves.
    pub fn of(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            ctime: change_time(metadata),
            mtime: metadata.modified().unwrap_or(UNIX_EPOCH),
        }
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    let secs = metadata.ctime();
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, metadata.ctime_nsec() as u32)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(UNIX_EPOCH)
}

/// State shared by file and directory records.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMeta {
    /// Entry name within its parent level.
    pub name: String,
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Path relative to the original scan root.
    pub rel_path: PathBuf,
    /// Timestamp of the last detected transition.
    pub last_change: SystemTime,
    /// Time since `last_change`, recomputed on each scan pass.
    pub age: Duration,
    /// Generation stamp: the scan generation at which this entry was last
    /// observed present. Falling behind the store's counter after a pass
    /// means the entry went missing.
    pub scan: u64,
    /// Set by the transition that (re)introduced the entry.
    pub created: bool,
    /// Set when the entry went missing from a scan pass.
    pub deleted: bool,
    /// Set when the fingerprint changed between passes.
    pub changed: bool,
    /// True only for entries present on the very first scan of the store.
    pub existed: bool,
    /// Cleared by each transition; set again when the change-notification
    /// query drains the entry.
    pub notified: bool,
}

impl EntryMeta {
    /// Creates meta for a freshly observed entry with all flags cleared.
    pub fn new(
        name: String,
        path: PathBuf,
        rel_path: PathBuf,
        timestamp: SystemTime,
        generation: u64,
    ) -> Self {
        Self {
            name,
            path,
            rel_path,
            last_change: timestamp,
            age: Duration::ZERO,
            scan: generation,
            created: false,
            deleted: false,
            changed: false,
            existed: false,
            notified: false,
        }
    }

    /// Recomputes `age` as `timestamp − last_change`, clamping to zero if
    /// the clock went backwards.
    pub fn refresh_age(&mut self, timestamp: SystemTime) {
        self.age = timestamp
            .duration_since(self.last_change)
            .unwrap_or_default();
    }
}

/// A tracked file (or symlink, reported with its own link status).
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub meta: EntryMeta,
    /// Fingerprint observed on the most recent pass.
    pub fingerprint: Fingerprint,
    /// The fingerprint before the last `changed` transition. Present for
    /// exactly one generation; cleared by the next pass or transition.
    pub prev: Option<Fingerprint>,
}

/// A tracked directory and the subtree of records below it.
#[derive(Debug, Clone, PartialEq)]
pub struct DirRecord {
    pub meta: EntryMeta,
    /// Aggregates over the subtree, recomputed on each scan.
    pub stats: DirStats,
    /// The sub-store of this directory.
    pub children: Children,
}

/// Statistics aggregated over a directory's observed descendants.
///
/// The optional fields stay `None` until a file contributes to them, so an
/// empty aggregate never pretends to have time bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirStats {
    /// Number of files in the subtree.
    pub num_files: u64,
    /// Number of directories in the subtree.
    pub num_dirs: u64,
    /// Sum of file sizes in the subtree.
    pub total_size: u64,
    /// Earliest change-time over the subtree's files.
    pub min_ctime: Option<SystemTime>,
    /// Latest modify-time over the subtree's files.
    pub max_mtime: Option<SystemTime>,
    /// Earliest last-transition timestamp in the subtree.
    pub min_last_change: Option<SystemTime>,
    /// Smallest age in the subtree.
    pub min_age: Option<Duration>,
}

impl DirStats {
    /// Folds one observed file into the aggregate.
    pub fn record_file(&mut self, file: &FileRecord) {
        self.num_files += 1;
        self.total_size += file.fingerprint.size;
        self.min_ctime = fold_min(self.min_ctime, file.fingerprint.ctime);
        self.max_mtime = fold_max(self.max_mtime, file.fingerprint.mtime);
        self.min_last_change = fold_min(self.min_last_change, file.meta.last_change);
        self.min_age = fold_min(self.min_age, file.meta.age);
    }

    /// Merges a recursed child directory's aggregate into this one.
    ///
    /// The child itself counts as one directory on top of whatever its own
    /// subtree contained.
    pub fn merge_dir(&mut self, child: &DirStats) {
        self.num_dirs += 1 + child.num_dirs;
        self.num_files += child.num_files;
        self.total_size += child.total_size;
        if let Some(t) = child.min_ctime {
            self.min_ctime = fold_min(self.min_ctime, t);
        }
        if let Some(t) = child.max_mtime {
            self.max_mtime = fold_max(self.max_mtime, t);
        }
        if let Some(t) = child.min_last_change {
            self.min_last_change = fold_min(self.min_last_change, t);
        }
        if let Some(a) = child.min_age {
            self.min_age = fold_min(self.min_age, a);
        }
    }
}

fn fold_min<T: Ord + Copy>(current: Option<T>, value: T) -> Option<T> {
    Some(match current {
        Some(c) => c.min(value),
        None => value,
    })
}

fn fold_max<T: Ord + Copy>(current: Option<T>, value: T) -> Option<T> {
    Some(match current {
        Some(c) => c.max(value),
        None => value,
    })
}

/// A single tracked entry, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    File(FileRecord),
    Dir(DirRecord),
}

impl Entry {
    /// Returns `true` for file-class entries (including symlinks).
    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    /// Returns `true` for directory entries.
    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Dir(_))
    }

    /// The entry name within its parent level.
    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// The absolute path of the entry.
    pub fn path(&self) -> &std::path::Path {
        &self.meta().path
    }

    /// The path relative to the original scan root.
    pub fn rel_path(&self) -> &std::path::Path {
        &self.meta().rel_path
    }

    /// Shared state, regardless of kind.
    pub fn meta(&self) -> &EntryMeta {
        match self {
            Entry::File(f) => &f.meta,
            Entry::Dir(d) => &d.meta,
        }
    }

    /// Mutable shared state, regardless of kind.
    pub fn meta_mut(&mut self) -> &mut EntryMeta {
        match self {
            Entry::File(f) => &mut f.meta,
            Entry::Dir(d) => &mut d.meta,
        }
    }

    /// The file record, if this is a file-class entry.
    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Entry::File(f) => Some(f),
            Entry::Dir(_) => None,
        }
    }

    /// The directory record, if this is a directory entry.
    pub fn as_dir(&self) -> Option<&DirRecord> {
        match self {
            Entry::File(_) => None,
            Entry::Dir(d) => Some(d),
        }
    }
}
