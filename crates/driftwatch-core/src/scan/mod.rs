//! The scan-and-diff engine.
//!
//! [`scan`] walks one directory (optionally recursively), diffs what it
//! finds against the caller's [`Store`], updates the store in place and
//! returns the number of detected changes. Deletion detection is a
//! mark-and-sweep over generation stamps: every observed entry is stamped
//! with the current scan generation, and whatever falls behind after a
//! pass went missing.
//!
//! Failures to list a directory or stat an entry are transient conditions,
//! not errors: the directory behaves as empty, the entry as unmatched, and
//! the generation sweep picks up the consequences on this or a later pass.

pub mod options;

pub use options::ScanOptions;

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::store::entry::{
    Children, DirRecord, DirStats, Entry, EntryMeta, FileRecord, Fingerprint,
};
use crate::store::{ScanControl, Store};

/// Scans `dir` against `store` and returns the number of detected changes.
///
/// Uses the current wall-clock time as the scan timestamp; see [`scan_at`]
/// for the explicit-clock variant.
///
/// # Examples
///
/// ```no_run
/// use driftwatch_core::{scan, ScanOptions, Store};
/// use std::path::Path;
///
/// let mut store = Store::new();
/// let opts = ScanOptions::new().recursive(true);
/// loop {
///     let changes = scan(Path::new("/var/incoming"), &mut store, &opts);
///     if changes > 0 {
///         // drain with driftwatch_core::get_changed(...)
///     }
///     std::thread::sleep(std::time::Duration::from_secs(1));
/// }
/// ```
pub fn scan(dir: &Path, store: &mut Store, opts: &ScanOptions) -> usize {
    scan_at(dir, store, opts, SystemTime::now())
}

/// Scans `dir` against `store` with an explicit scan timestamp.
///
/// The timestamp is recorded as the pass's `last_change` for every
/// transition and drives all `age` computations, which makes age-dependent
/// behaviour testable without sleeping.
///
/// The first scan of a cold store records everything it finds as
/// pre-existing background and returns `0` unless
/// [`ScanOptions::notify_existing`] is set. Scanning with a different
/// name/path filter signature than the store was populated under discards
/// the whole store first: filter changes are never incremental.
pub fn scan_at(dir: &Path, store: &mut Store, opts: &ScanOptions, timestamp: SystemTime) -> usize {
    let signature = opts.signature();
    if store
        .control
        .as_ref()
        .is_some_and(|c| c.signature != signature)
    {
        tracing::debug!(path = %dir.display(), "filter signature changed, resetting store");
        store.reset();
    }

    let first_scan = store.control.is_none();
    let generation = match &mut store.control {
        Some(control) => {
            control.last_scan = timestamp;
            control.generation += 1;
            control.generation
        }
        None => {
            store.control = Some(ScanControl {
                started_at: timestamp,
                last_scan: timestamp,
                generation: 1,
                signature,
            });
            1
        }
    };

    let pass = Pass {
        opts,
        timestamp,
        generation,
        first_scan,
    };
    let outcome = scan_level(&pass, dir, Path::new(""), &mut store.entries);
    store.root_stats = outcome.stats;
    outcome.changes
}

/// Per-invocation scan state shared by every level of the walk.
struct Pass<'a> {
    opts: &'a ScanOptions,
    timestamp: SystemTime,
    generation: u64,
    first_scan: bool,
}

/// What one directory level reports back to its parent.
struct LevelOutcome {
    changes: usize,
    stats: DirStats,
}

fn scan_level(pass: &Pass<'_>, dir: &Path, rel: &Path, entries: &mut Children) -> LevelOutcome {
    let mut changes = 0;
    let mut stats = DirStats::default();

    match fs::read_dir(dir) {
        Ok(listing) => {
            for dir_entry in listing.flatten() {
                let name = dir_entry.file_name().to_string_lossy().into_owned();
                let full = dir.join(&name);
                let rel_path = rel.join(&name);

                if let Some(filter) = &pass.opts.name_filter {
                    if !filter.is_match(&name) {
                        continue;
                    }
                }
                if let Some(filter) = &pass.opts.path_filter {
                    if !filter.is_match(&full.to_string_lossy()) {
                        continue;
                    }
                }

                // Own link status, never the target's.
                let metadata = match fs::symlink_metadata(&full) {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        tracing::debug!(path = %full.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };

                if metadata.is_dir() {
                    if !pass.opts.recursive {
                        continue;
                    }

                    let mut children = match entries.get_mut(&name) {
                        Some(Entry::Dir(dir_record)) => std::mem::take(&mut dir_record.children),
                        _ => Children::new(),
                    };
                    let outcome = scan_level(pass, &full, &rel_path, &mut children);
                    changes += outcome.changes;

                    if children.is_empty() {
                        // Nothing tracked below; an existing record is left
                        // unstamped and the sweep takes it.
                        continue;
                    }

                    let child_stats = outcome.stats;
                    let last_change = child_stats.min_last_change.unwrap_or(pass.timestamp);
                    match entries.get_mut(&name) {
                        Some(Entry::Dir(dir_record)) => {
                            dir_record.meta.scan = pass.generation;
                            dir_record.meta.last_change = last_change;
                            dir_record.meta.refresh_age(pass.timestamp);
                            dir_record.stats = child_stats;
                            dir_record.children = children;
                        }
                        Some(entry @ Entry::File(_)) => {
                            // A file of this name stopped being a file; its
                            // record's life ends with one counted change.
                            changes += 1;
                            let mut meta = EntryMeta::new(
                                name.clone(),
                                full,
                                rel_path,
                                pass.timestamp,
                                pass.generation,
                            );
                            meta.created = true;
                            *entry = Entry::Dir(DirRecord {
                                meta,
                                stats: child_stats,
                                children,
                            });
                        }
                        None => {
                            let mut meta = EntryMeta::new(
                                name.clone(),
                                full,
                                rel_path,
                                pass.timestamp,
                                pass.generation,
                            );
                            meta.created = !pass.first_scan;
                            meta.existed = pass.first_scan;
                            meta.last_change = last_change;
                            meta.refresh_age(pass.timestamp);
                            entries.insert(
                                name,
                                Entry::Dir(DirRecord {
                                    meta,
                                    stats: child_stats,
                                    children,
                                }),
                            );
                        }
                    }
                    stats.merge_dir(&child_stats);
                    continue;
                }

                let fingerprint = Fingerprint::of(&metadata);
                match entries.get_mut(&name) {
                    Some(Entry::File(file)) => {
                        if file.meta.deleted {
                            // Resurfaced after a deletion.
                            changes += 1;
                            file.prev = None;
                            file.fingerprint = fingerprint;
                            file.meta.created = true;
                            file.meta.deleted = false;
                            file.meta.changed = false;
                            file.meta.notified = false;
                            file.meta.last_change = pass.timestamp;
                            file.meta.age = Duration::ZERO;
                        } else if file.fingerprint != fingerprint {
                            changes += 1;
                            file.prev = Some(file.fingerprint);
                            file.fingerprint = fingerprint;
                            file.meta.changed = true;
                            file.meta.created = false;
                            file.meta.notified = false;
                            file.meta.last_change = pass.timestamp;
                            file.meta.age = Duration::ZERO;
                        } else {
                            file.meta.refresh_age(pass.timestamp);
                            // prev lives exactly one generation.
                            file.prev = None;
                        }
                        file.meta.scan = pass.generation;
                        stats.record_file(file);
                    }
                    Some(entry @ Entry::Dir(_)) => {
                        // A directory of this name stopped being one.
                        changes += 1;
                        let mut meta = EntryMeta::new(
                            name.clone(),
                            full,
                            rel_path,
                            pass.timestamp,
                            pass.generation,
                        );
                        meta.created = true;
                        let record = FileRecord {
                            meta,
                            fingerprint,
                            prev: None,
                        };
                        stats.record_file(&record);
                        *entry = Entry::File(record);
                    }
                    None => {
                        let silent = pass.first_scan && !pass.opts.notify_existing;
                        if !silent {
                            changes += 1;
                        }
                        let mut meta = EntryMeta::new(
                            name.clone(),
                            full,
                            rel_path,
                            pass.timestamp,
                            pass.generation,
                        );
                        meta.created = !pass.first_scan;
                        meta.existed = pass.first_scan;
                        meta.notified = silent;
                        let record = FileRecord {
                            meta,
                            fingerprint,
                            prev: None,
                        };
                        stats.record_file(&record);
                        entries.insert(name, Entry::File(record));
                    }
                }
            }
        }
        Err(e) => {
            // Transient: the directory may have vanished between the
            // parent's listing and this step. Behaves as an empty listing.
            tracing::debug!(path = %dir.display(), error = %e, "directory unreadable, treating as empty");
        }
    }

    // Sweep: whatever kept a stale generation stamp went missing this pass.
    let names: Vec<String> = entries.keys().cloned().collect();
    for name in names {
        let missing = match entries.get(&name) {
            Some(entry) => entry.meta().scan != pass.generation,
            None => continue,
        };
        if pass.opts.ignore_deleted && missing {
            entries.shift_remove(&name);
            continue;
        }
        let Some(entry) = entries.get_mut(&name) else {
            continue;
        };
        let meta = entry.meta_mut();
        let transitioned = meta.deleted != missing;
        if transitioned {
            changes += 1;
            meta.scan = pass.generation;
            meta.deleted = missing;
            meta.created = !missing;
            meta.changed = false;
            meta.notified = false;
            meta.last_change = pass.timestamp;
            meta.age = Duration::ZERO;
            if missing {
                meta.existed = false;
            }
        } else if meta.deleted {
            // Still gone; keep it aging for age-based queries.
            meta.refresh_age(pass.timestamp);
        }
        if transitioned && missing {
            if let Entry::File(file) = entry {
                file.prev = None;
            }
        }
    }

    LevelOutcome { changes, stats }
}
