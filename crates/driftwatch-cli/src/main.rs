//! driftwatch — poll a directory tree and log what changed.
//!
//! Thin demo harness around `driftwatch-core`: sleep, scan, drain, repeat.
//! The scan engine itself owns neither the loop nor the interval.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use driftwatch_core::{get_changed, scan, FileRecord, ProjectInfo, ScanOptions, Store};
use regex::Regex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "driftwatch", about = "Poll a directory tree and report changes")]
struct Args {
    /// Directory to monitor.
    dir: PathBuf,

    /// Seconds between polls.
    #[arg(short, long, default_value_t = 1.0)]
    interval: f64,

    /// Regex tested against entry names.
    #[arg(short = 'n', long)]
    name_filter: Option<Regex>,

    /// Regex tested against full entry paths.
    #[arg(short = 'p', long)]
    path_filter: Option<Regex>,

    /// Recurse into subdirectories.
    #[arg(short, long)]
    recursive: bool,

    /// Drop deleted entries instead of reporting them.
    #[arg(long)]
    ignore_deleted: bool,

    /// Report entries that already existed on the first poll.
    #[arg(long)]
    notify_existing: bool,

    /// Minimum seconds since an entry's last transition before reporting it.
    #[arg(long, default_value_t = 0.0)]
    min_age: f64,

    /// Project descriptor announced at startup, if present.
    #[arg(long, default_value = "PROJECT.txt")]
    project: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.interval >= 0.0, "--interval must not be negative");
    anyhow::ensure!(args.min_age >= 0.0, "--min-age must not be negative");

    let info = ProjectInfo::load(&args.project)
        .with_context(|| format!("failed to read {}", args.project.display()))?;
    if let Some(name) = info.name() {
        tracing::info!(
            "{} {}",
            name,
            info.version().unwrap_or("(unversioned)")
        );
    }

    let opts = ScanOptions {
        name_filter: args.name_filter,
        path_filter: args.path_filter,
        recursive: args.recursive,
        ignore_deleted: args.ignore_deleted,
        notify_existing: args.notify_existing,
    };
    let interval = Duration::from_secs_f64(args.interval);
    let min_age = Duration::from_secs_f64(args.min_age);

    tracing::info!(dir = %args.dir.display(), "watching");

    let mut store = Store::new();
    loop {
        let changes = scan(&args.dir, &mut store, &opts);
        if changes > 0 {
            for record in get_changed(&mut store, min_age) {
                tracing::info!("{}", describe(&record));
            }
        }
        thread::sleep(interval);
    }
}

/// One-line report for a drained record.
fn describe(record: &FileRecord) -> String {
    let tag = if record.meta.deleted {
        "DELETED"
    } else if record.meta.created {
        "CREATED"
    } else if record.meta.changed {
        "CHANGED"
    } else {
        "EXISTING"
    };
    format!(
        "[{tag}] {} {{size={}}}",
        record.meta.rel_path.display(),
        record.fingerprint.size
    )
}
