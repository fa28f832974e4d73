//! Directory enumeration feeding the pipeline.
//!
//! The walk is preorder in directory order and never follows symlinks.
//! Anything named `staging` below the root is pruned with its whole subtree.
//! `walkdir` keeps its own stack of open directories, so tree depth never
//! turns into call-stack depth.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fschurn_config::{log_walk_debug, log_walk_warn};
use fschurn_store::STAGING_DIR;
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::queue::Producer;

/// Entries visited between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 10;

/// Pause before restarting a pass that found nothing to emit.
const EMPTY_PASS_BACKOFF: Duration = Duration::from_millis(50);

fn not_staging(entry: &DirEntry) -> bool {
    entry.depth() == 0 || entry.file_name() != STAGING_DIR
}

/// One pass over the regular files under a root.
///
/// Enumeration errors are logged and counted; the unreadable subtree is
/// skipped and the rest of the tree is still visited.
pub struct Walk {
    inner: FilterEntry<walkdir::IntoIter, fn(&DirEntry) -> bool>,
    deadline: Option<Instant>,
    visited: u64,
    errors: u64,
    expired: bool,
}

impl Walk {
    pub fn new(root: &Path, deadline: Option<Instant>) -> Self {
        let filter: fn(&DirEntry) -> bool = not_staging;
        Self {
            inner: WalkDir::new(root).into_iter().filter_entry(filter),
            deadline,
            visited: 0,
            errors: 0,
            expired: false,
        }
    }

    /// Enumeration errors seen so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// True once the walk stopped early because the deadline passed.
    pub fn expired(&self) -> bool {
        self.expired
    }

    fn check_deadline(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if self.visited % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                self.expired = true;
            }
        }
        self.expired
    }
}

impl Iterator for Walk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.check_deadline() {
                return None;
            }
            self.visited += 1;

            match self.inner.next()? {
                Ok(entry) => {
                    if entry.file_type().is_file() {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => {
                    self.errors += 1;
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    log_walk_warn!(path = %path, error = %e, "Failed to enumerate, skipping subtree");
                }
            }
        }
    }
}

/// How long the traversal keeps feeding the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A single pass over the tree.
    Once,
    /// Restart from the root after every pass until the deadline.
    Until(Instant),
}

impl Schedule {
    pub fn for_duration(duration: Duration) -> Self {
        Schedule::Until(Instant::now() + duration)
    }

    fn deadline(&self) -> Option<Instant> {
        match self {
            Schedule::Once => None,
            Schedule::Until(deadline) => Some(*deadline),
        }
    }
}

/// What the traversal stage did over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub passes: u64,
    pub emitted: u64,
    pub errors: u64,
    /// The downstream queue was closed by its consumer before we finished.
    pub downstream_closed: bool,
}

/// Walk `root` per `schedule`, pushing every regular file into `queue`.
///
/// Blocks whenever the queue is full. Returns early once every consumer of
/// the queue is gone. The caller's producer stays open.
pub fn feed(root: &Path, schedule: Schedule, queue: &Producer<PathBuf>) -> FeedReport {
    let mut report = FeedReport::default();

    loop {
        if let Schedule::Until(deadline) = schedule {
            if Instant::now() >= deadline {
                break;
            }
        }

        let mut walk = Walk::new(root, schedule.deadline());
        let mut emitted = 0u64;
        for path in &mut walk {
            if queue.push(path).is_err() {
                report.downstream_closed = true;
                break;
            }
            emitted += 1;
        }

        report.passes += 1;
        report.emitted += emitted;
        report.errors += walk.errors();
        log_walk_debug!(pass = report.passes, emitted, expired = walk.expired(), "Traversal pass complete");

        if report.downstream_closed {
            break;
        }
        match schedule {
            Schedule::Once => break,
            Schedule::Until(deadline) => {
                if emitted == 0 {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    thread::sleep(remaining.min(EMPTY_PASS_BACKOFF));
                }
            }
        }
    }

    report
}
