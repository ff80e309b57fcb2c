//! Read and notification-drain operations over a snapshot store.
//!
//! All traversals are single-pass, depth-first and follow each level's
//! insertion order, so repeated queries over an unchanged store yield
//! identical orderings. Only [`get_changed`] mutates: it drains the
//! `notified` flag and purges acknowledged deletions. The age filter and
//! the predicate filters borrow the store immutably and can never purge.
//!
//! None of these operations may run concurrently with a scan of the same
//! store from another thread; the store is single-threaded state.

use std::time::Duration;

use crate::store::entry::{Children, Entry, FileRecord};
use crate::store::Store;

/// Drains the change notifications out of a store.
///
/// Collects every file-class record with `notified == false` and
/// `age >= min_age`, marking each one notified as it is yielded. A yielded
/// record that is also `deleted` is removed from the store permanently —
/// the deletion has been acknowledged and the record's life is over.
///
/// Calling this twice with no intervening scan yields each qualifying
/// record at most once.
pub fn get_changed(store: &mut Store, min_age: Duration) -> Vec<FileRecord> {
    let mut out = Vec::new();
    drain_level(&mut store.entries, min_age, &mut out);
    out
}

fn drain_level(entries: &mut Children, min_age: Duration, out: &mut Vec<FileRecord>) {
    let names: Vec<String> = entries.keys().cloned().collect();
    for name in names {
        let Some(entry) = entries.get_mut(&name) else {
            continue;
        };
        match entry {
            Entry::Dir(dir) => drain_level(&mut dir.children, min_age, out),
            Entry::File(file) => {
                if !file.meta.notified && file.meta.age >= min_age {
                    file.meta.notified = true;
                    let deleted = file.meta.deleted;
                    out.push(file.clone());
                    if deleted {
                        entries.shift_remove(&name);
                    }
                }
            }
        }
    }
}

/// Returns the file-class records whose `age` is at least `min_age`.
///
/// Purely a read: `notified` state is neither consulted nor touched, and
/// nothing is removed from the store.
pub fn filter_by_age(store: &Store, min_age: Duration) -> Vec<&FileRecord> {
    filter_files(store, |file| file.meta.age >= min_age)
}

/// Returns the file-class records matching `predicate`.
///
/// Pass `|_| true` to collect every file.
pub fn filter_files<F>(store: &Store, mut predicate: F) -> Vec<&FileRecord>
where
    F: FnMut(&FileRecord) -> bool,
{
    let mut out = Vec::new();
    files_level(&store.entries, &mut predicate, &mut out);
    out
}

fn files_level<'a, F>(entries: &'a Children, predicate: &mut F, out: &mut Vec<&'a FileRecord>)
where
    F: FnMut(&FileRecord) -> bool,
{
    for entry in entries.values() {
        match entry {
            Entry::Dir(dir) => files_level(&dir.children, predicate, out),
            Entry::File(file) => {
                if predicate(file) {
                    out.push(file);
                }
            }
        }
    }
}

/// Counts the file-class records matching `predicate`.
pub fn count_files<F>(store: &Store, mut predicate: F) -> usize
where
    F: FnMut(&FileRecord) -> bool,
{
    fn level<F>(entries: &Children, predicate: &mut F) -> usize
    where
        F: FnMut(&FileRecord) -> bool,
    {
        entries
            .values()
            .map(|entry| match entry {
                Entry::Dir(dir) => level(&dir.children, predicate),
                Entry::File(file) => usize::from(predicate(file)),
            })
            .sum()
    }
    level(&store.entries, &mut predicate)
}

/// Returns every entry — files and directories — matching `predicate`.
///
/// Pre-order over the whole tree: a directory is evaluated before its
/// children are visited, and its children are visited whether or not the
/// directory itself matched.
pub fn filter_entries<F>(store: &Store, mut predicate: F) -> Vec<&Entry>
where
    F: FnMut(&Entry) -> bool,
{
    let mut out = Vec::new();
    entries_level(&store.entries, &mut predicate, &mut out);
    out
}

fn entries_level<'a, F>(entries: &'a Children, predicate: &mut F, out: &mut Vec<&'a Entry>)
where
    F: FnMut(&Entry) -> bool,
{
    for entry in entries.values() {
        if predicate(entry) {
            out.push(entry);
        }
        if let Entry::Dir(dir) = entry {
            entries_level(&dir.children, predicate, out);
        }
    }
}

/// Counts the entries — files and directories — matching `predicate`.
pub fn count_entries<F>(store: &Store, mut predicate: F) -> usize
where
    F: FnMut(&Entry) -> bool,
{
    fn level<F>(entries: &Children, predicate: &mut F) -> usize
    where
        F: FnMut(&Entry) -> bool,
    {
        entries
            .values()
            .map(|entry| {
                let own = usize::from(predicate(entry));
                match entry {
                    Entry::Dir(dir) => own + level(&dir.children, predicate),
                    Entry::File(_) => own,
                }
            })
            .sum()
    }
    level(&store.entries, &mut predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan, scan_at, ScanOptions};
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn populated_store(tmp: &TempDir) -> Store {
        fs::write(tmp.path().join("alpha.txt"), "aaaa").unwrap();
        fs::write(tmp.path().join("beta.log"), "bb").unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("gamma.txt"), "gggggg").unwrap();

        let mut store = Store::new();
        scan(tmp.path(), &mut store, &ScanOptions::new().recursive(true));
        store
    }

    #[test]
    fn get_changed_drains_once() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("one.txt"), "1").unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new();
        scan(tmp.path(), &mut store, &opts);

        fs::write(tmp.path().join("two.txt"), "2").unwrap();
        scan(tmp.path(), &mut store, &opts);

        let first = get_changed(&mut store, Duration::ZERO);
        let second = get_changed(&mut store, Duration::ZERO);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].meta.name, "two.txt");
        assert!(second.is_empty());
    }

    #[test]
    fn get_changed_respects_min_age() {
        let tmp = TempDir::new().unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new();
        let t0 = SystemTime::now();
        scan_at(tmp.path(), &mut store, &opts, t0);

        fs::write(tmp.path().join("young.txt"), "y").unwrap();
        scan_at(tmp.path(), &mut store, &opts, t0 + Duration::from_secs(1));

        // too young to be drained yet
        assert!(get_changed(&mut store, Duration::from_secs(5)).is_empty());

        // a later scan ages it past the threshold without changing it
        scan_at(tmp.path(), &mut store, &opts, t0 + Duration::from_secs(10));
        let drained = get_changed(&mut store, Duration::from_secs(5));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].meta.name, "young.txt");
    }

    #[test]
    fn get_changed_purges_acknowledged_deletions() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("doomed.txt"), "x").unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new();
        scan(tmp.path(), &mut store, &opts);

        fs::remove_file(tmp.path().join("doomed.txt")).unwrap();
        scan(tmp.path(), &mut store, &opts);
        assert!(store.get("doomed.txt").is_some());

        let drained = get_changed(&mut store, Duration::ZERO);

        assert_eq!(drained.len(), 1);
        assert!(drained[0].meta.deleted);
        assert!(store.get("doomed.txt").is_none());
    }

    #[test]
    fn filter_by_age_does_not_drain() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("kept.txt"), "k").unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new().notify_existing(true);
        scan(tmp.path(), &mut store, &opts);

        let first = filter_by_age(&store, Duration::ZERO);
        let second = filter_by_age(&store, Duration::ZERO);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        // reads never touch notification state
        assert_eq!(get_changed(&mut store, Duration::ZERO).len(), 1);
    }

    #[test]
    fn filter_by_age_excludes_young_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("old.txt"), "o").unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new();
        let t0 = SystemTime::now();
        scan_at(tmp.path(), &mut store, &opts, t0);

        fs::write(tmp.path().join("new.txt"), "n").unwrap();
        scan_at(tmp.path(), &mut store, &opts, t0 + Duration::from_secs(60));

        let aged = filter_by_age(&store, Duration::from_secs(30));

        assert_eq!(aged.len(), 1);
        assert_eq!(aged[0].meta.name, "old.txt");
    }

    #[test]
    fn filter_by_age_grows_as_the_clock_advances() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let mut store = Store::new();
        let opts = ScanOptions::new();
        let t0 = SystemTime::now();
        scan_at(tmp.path(), &mut store, &opts, t0);

        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        scan_at(tmp.path(), &mut store, &opts, t0 + Duration::from_secs(10));
        assert_eq!(filter_by_age(&store, Duration::from_secs(5)).len(), 1);

        scan_at(tmp.path(), &mut store, &opts, t0 + Duration::from_secs(30));
        assert_eq!(filter_by_age(&store, Duration::from_secs(5)).len(), 2);
    }

    #[test]
    fn filter_files_applies_predicate_to_files_only() {
        let tmp = TempDir::new().unwrap();
        let store = populated_store(&tmp);

        let txt = filter_files(&store, |f| f.meta.name.ends_with(".txt"));
        let all = filter_files(&store, |_| true);

        assert_eq!(txt.len(), 2);
        assert_eq!(all.len(), 3);
        assert!(txt.iter().all(|f| f.meta.name.ends_with(".txt")));
    }

    #[test]
    fn count_files_matches_filter_files() {
        let tmp = TempDir::new().unwrap();
        let store = populated_store(&tmp);

        assert_eq!(count_files(&store, |_| true), 3);
        assert_eq!(
            count_files(&store, |f| f.fingerprint.size > 3),
            filter_files(&store, |f| f.fingerprint.size > 3).len()
        );
    }

    #[test]
    fn filter_entries_visits_directories_before_children() {
        let tmp = TempDir::new().unwrap();
        let store = populated_store(&tmp);

        let all = filter_entries(&store, |_| true);

        assert_eq!(all.len(), 4); // three files plus the directory
        let dir_pos = all.iter().position(|e| e.name() == "sub").unwrap();
        let child_pos = all.iter().position(|e| e.name() == "gamma.txt").unwrap();
        assert!(dir_pos < child_pos);
    }

    #[test]
    fn filter_entries_descends_past_non_matching_directories() {
        let tmp = TempDir::new().unwrap();
        let store = populated_store(&tmp);

        // the directory itself fails the predicate, its child still matches
        let found = filter_entries(&store, |e| e.name() == "gamma.txt");

        assert_eq!(found.len(), 1);
        assert!(found[0].is_file());
    }

    #[test]
    fn count_entries_includes_directories() {
        let tmp = TempDir::new().unwrap();
        let store = populated_store(&tmp);

        assert_eq!(count_entries(&store, |_| true), 4);
        assert_eq!(count_entries(&store, Entry::is_dir), 1);
        assert_eq!(count_entries(&store, Entry::is_file), 3);
    }

    #[test]
    fn queries_on_an_empty_store_yield_nothing() {
        let mut store = Store::new();

        assert!(get_changed(&mut store, Duration::ZERO).is_empty());
        assert!(filter_by_age(&store, Duration::ZERO).is_empty());
        assert_eq!(count_files(&store, |_| true), 0);
        assert_eq!(count_entries(&store, |_| true), 0);
    }
}
