//! Counters shared by the pipeline stages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::ops::{Operation, Outcome};
use crate::traversal::FeedReport;

/// Live counters, updated lock-free by every stage.
#[derive(Debug, Default)]
pub struct Progress {
    admitted: AtomicU64,
    dispatched: AtomicU64,
    verify_reads: AtomicU64,
    range_reads: AtomicU64,
    range_read_writes: AtomicU64,
    writes_new: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    vanished: AtomicU64,
    integrity_violations: AtomicU64,
    failed_workers: AtomicU64,
}

impl Progress {
    /// Record one admitted path emitted `copies` times; returns the admitted total.
    pub fn record_admitted(&self, copies: u32) -> u64 {
        self.dispatched.fetch_add(copies as u64, Ordering::Relaxed);
        self.admitted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record(&self, op: Operation, outcome: &Outcome) {
        let counter = match op {
            Operation::VerifyRead => &self.verify_reads,
            Operation::RangeRead => &self.range_reads,
            Operation::RangeReadWrite => &self.range_read_writes,
            Operation::WriteNew => &self.writes_new,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Outcome::Done { read, written } => {
                self.bytes_read.fetch_add(*read, Ordering::Relaxed);
                self.bytes_written.fetch_add(*written, Ordering::Relaxed);
            }
            Outcome::Vanished => {
                self.vanished.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::IntegrityViolation { read, .. } => {
                self.bytes_read.fetch_add(*read, Ordering::Relaxed);
                self.integrity_violations.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_worker_failure(&self) {
        self.failed_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStats {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        RunStats {
            admitted: load(&self.admitted),
            dispatched: load(&self.dispatched),
            verify_reads: load(&self.verify_reads),
            range_reads: load(&self.range_reads),
            range_read_writes: load(&self.range_read_writes),
            writes_new: load(&self.writes_new),
            bytes_read: load(&self.bytes_read),
            bytes_written: load(&self.bytes_written),
            vanished: load(&self.vanished),
            integrity_violations: load(&self.integrity_violations),
            failed_workers: load(&self.failed_workers),
            ..RunStats::default()
        }
    }
}

/// Snapshot of a finished (or running) pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub traversal_passes: u64,
    pub files_found: u64,
    pub walk_errors: u64,
    pub admitted: u64,
    pub dispatched: u64,
    pub verify_reads: u64,
    pub range_reads: u64,
    pub range_read_writes: u64,
    pub writes_new: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub vanished: u64,
    pub integrity_violations: u64,
    pub failed_workers: u64,
    pub elapsed_secs: f64,
}

impl RunStats {
    pub fn with_feed(mut self, feed: &FeedReport) -> Self {
        self.traversal_passes = feed.passes;
        self.files_found = feed.emitted;
        self.walk_errors = feed.errors;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_secs = elapsed.as_secs_f64();
        self
    }

    pub fn operations(&self) -> u64 {
        self.verify_reads + self.range_reads + self.range_read_writes + self.writes_new
    }
}
