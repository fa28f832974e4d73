//! Fills a store with random entries until a share of the free space is used.

use std::thread;

use fschurn_config::{log_fill_error, log_fill_info, SizeRange};
use fschurn_store::{ContentStore, RandomReader};
use rand::Rng;
use serde::Serialize;

use crate::seeds::Seeds;
use crate::space::SpaceProbe;
use crate::PipelineError;

/// Writer 0 logs a progress line every this many files.
const REPORT_EVERY_FILES: u64 = 100;

/// How much to write and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillPlan {
    /// Share of the currently available space to consume, 0..=100
    pub percent: u8,
    pub writers: usize,
    pub sizes: SizeRange,
}

impl FillPlan {
    /// Total bytes to write given `available` bytes of free space.
    pub fn budget(&self, available: u64) -> u64 {
        (available as u128 * self.percent.min(100) as u128 / 100) as u64
    }

    /// Bytes assigned to each writer. The remainder of the split is not written.
    pub fn per_writer(&self, available: u64) -> u64 {
        self.budget(available) / self.writers.max(1) as u64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub files: u64,
    pub bytes: u64,
    pub failed_writers: u64,
}

impl FillReport {
    fn merge(&mut self, other: FillReport) {
        self.files += other.files;
        self.bytes += other.bytes;
        self.failed_writers += other.failed_writers;
    }
}

/// Draw the size of the next generated file.
///
/// Writers call this before streaming the file's bytes from the same
/// generator, so a seeded writer produces a reproducible sequence.
pub fn draw_size<R: Rng + ?Sized>(rng: &mut R, sizes: &SizeRange) -> u64 {
    rng.gen_range(sizes.min..=sizes.max)
}

/// Write random entries into `store` until each writer has spent its share.
pub fn fill<P: SpaceProbe>(
    store: &ContentStore,
    plan: &FillPlan,
    probe: &P,
    seeds: Seeds,
) -> Result<FillReport, PipelineError> {
    if plan.writers == 0 {
        return Err(PipelineError::Config("at least one writer is required".into()));
    }
    plan.sizes.validate()?;

    store.prepare()?;
    let available = probe.available_bytes(store.root())?;
    let per_writer = plan.per_writer(available);

    log_fill_info!(
        root = %store.root().display(),
        available,
        percent = plan.percent,
        writers = plan.writers,
        per_writer,
        "Starting fill"
    );

    let report = thread::scope(|s| -> Result<FillReport, PipelineError> {
        let mut handles = Vec::with_capacity(plan.writers);
        for idx in 0..plan.writers {
            let sizes = plan.sizes;
            let rng = seeds.worker(idx);
            let handle = thread::Builder::new()
                .name(format!("writer-{:02}", idx))
                .spawn_scoped(s, move || write_files(store, idx, rng, &sizes, per_writer))?;
            handles.push(handle);
        }

        let mut report = FillReport::default();
        for handle in handles {
            match handle.join() {
                Ok(r) => report.merge(r),
                Err(_) => report.failed_writers += 1,
            }
        }
        Ok(report)
    })?;

    log_fill_info!(
        files = report.files,
        bytes = report.bytes,
        failed_writers = report.failed_writers,
        "Fill finished"
    );
    Ok(report)
}

fn write_files<R: Rng>(
    store: &ContentStore,
    idx: usize,
    mut rng: R,
    sizes: &SizeRange,
    mut remaining: u64,
) -> FillReport {
    let mut report = FillReport::default();

    while remaining > 0 {
        let size = draw_size(&mut rng, sizes).min(remaining);

        if let Err(e) = store.write(idx, RandomReader::new(&mut rng), size) {
            log_fill_error!(writer = idx, size, error = %e, "Write failed, stopping writer");
            report.failed_writers = 1;
            break;
        }

        remaining -= size;
        report.files += 1;
        report.bytes += size;

        if idx == 0 && report.files % REPORT_EVERY_FILES == 0 {
            log_fill_info!(writer = idx, files = report.files, "Fill progress");
        }
    }

    report
}
