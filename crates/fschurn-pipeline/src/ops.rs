//! The four per-path operations a worker can perform.
//!
//! Every operation tolerates its target disappearing: another worker may
//! have replaced or removed the file since it was discovered. That case
//! yields [`Outcome::Vanished`] instead of an error.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use fschurn_config::{log_worker_debug, log_worker_error, OperationWeights};
use fschurn_store::{verify_file, ContentStore, Digest, RandomReader, StoreError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read the whole file and check its digest against its name
    VerifyRead,
    /// Read a random byte range into a sink
    RangeRead,
    /// Read a random byte range and write it back in place
    RangeReadWrite,
    /// Replace the file with a fresh store entry of the same size
    WriteNew,
}

impl Operation {
    /// In the order of [`OperationWeights::as_array`].
    pub const ALL: [Operation; 4] = [
        Operation::VerifyRead,
        Operation::RangeRead,
        Operation::RangeReadWrite,
        Operation::WriteNew,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::VerifyRead => "verify-read",
            Operation::RangeRead => "range-read",
            Operation::RangeReadWrite => "range-read-write",
            Operation::WriteNew => "write-new",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted random choice between operations.
#[derive(Debug, Clone)]
pub struct OperationPicker {
    index: WeightedIndex<u32>,
}

impl OperationPicker {
    pub fn new(weights: &OperationWeights) -> Result<Self, PipelineError> {
        let index = WeightedIndex::new(weights.as_array())
            .map_err(|e| PipelineError::Config(format!("operation weights: {}", e)))?;
        Ok(Self { index })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Operation {
        Operation::ALL[self.index.sample(rng)]
    }
}

/// Byte range touched by the partial operations.
///
/// `offset` is always inside the file; `offset + length` may run past the
/// end, which turns into a short read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, size: u64) -> Self {
        if size == 0 {
            return Self { offset: 0, length: 0 };
        }
        let offset = ((rng.gen::<f64>() * size as f64) as u64).min(size - 1);
        let length = (rng.gen_range(0.1..0.6) * size as f64) as u64;
        Self { offset, length }
    }
}

/// What an operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done { read: u64, written: u64 },
    /// The target was gone by the time we reached it
    Vanished,
    /// Contents do not hash to the file's name
    IntegrityViolation { read: u64, name: String, actual: Digest },
}

impl Outcome {
    fn read(read: u64) -> Self {
        Outcome::Done { read, written: 0 }
    }
}

/// Per-worker handle passed to every operation.
pub struct OpContext<'a, R> {
    pub store: &'a ContentStore,
    pub worker: usize,
    pub rng: &'a mut R,
}

/// Run `op` against `path`.
///
/// Errors other than the target going missing are returned to the caller,
/// which treats them as fatal for the worker.
pub fn execute<R: Rng>(
    op: Operation,
    path: &Path,
    ctx: &mut OpContext<'_, R>,
) -> Result<Outcome, StoreError> {
    let outcome = match op {
        Operation::VerifyRead => verify_read(path, ctx.store),
        Operation::RangeRead => range_read(path, &mut *ctx.rng),
        Operation::RangeReadWrite => range_read_write(path, &mut *ctx.rng),
        Operation::WriteNew => write_new(path, ctx.store, ctx.worker, &mut *ctx.rng),
    }?;

    log_worker_debug!(worker = ctx.worker, op = %op, path = %path.display(), outcome = ?outcome, "Operation finished");
    Ok(outcome)
}

/// Map not-found to `None` so callers can bail out with [`Outcome::Vanished`].
fn present<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn verify_read(path: &Path, store: &ContentStore) -> Result<Outcome, StoreError> {
    let verification = match verify_file(path, store.algorithm()) {
        Ok(v) => v,
        Err(e) if e.is_not_found() => return Ok(Outcome::Vanished),
        Err(e) => return Err(e),
    };

    if verification.is_intact() {
        return Ok(Outcome::read(verification.bytes));
    }

    log_worker_error!(
        path = %path.display(),
        actual = %verification.actual,
        "Integrity violation: contents do not match name"
    );
    Ok(Outcome::IntegrityViolation {
        read: verification.bytes,
        name: verification.name,
        actual: verification.actual,
    })
}

pub fn range_read<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Result<Outcome, StoreError> {
    let Some(mut file) = present(File::open(path))? else {
        return Ok(Outcome::Vanished);
    };
    let size = file.metadata()?.len();
    let range = ByteRange::sample(rng, size);

    file.seek(SeekFrom::Start(range.offset))?;
    let read = io::copy(&mut file.take(range.length), &mut io::sink())?;
    Ok(Outcome::read(read))
}

pub fn range_read_write<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> Result<Outcome, StoreError> {
    let Some(mut file) = present(File::open(path))? else {
        return Ok(Outcome::Vanished);
    };
    let size = file.metadata()?.len();
    let range = ByteRange::sample(rng, size);

    file.seek(SeekFrom::Start(range.offset))?;
    let mut buf = Vec::with_capacity(range.length.min(size) as usize);
    (&mut file).take(range.length).read_to_end(&mut buf)?;
    drop(file);

    let Some(mut file) = present(OpenOptions::new().read(true).write(true).open(path))? else {
        return Ok(Outcome::Vanished);
    };
    file.seek(SeekFrom::Start(range.offset))?;
    file.write_all(&buf)?;

    let n = buf.len() as u64;
    Ok(Outcome::Done { read: n, written: n })
}

pub fn write_new<R: Rng + ?Sized>(
    path: &Path,
    store: &ContentStore,
    worker: usize,
    rng: &mut R,
) -> Result<Outcome, StoreError> {
    let Some(meta) = present(fs::metadata(path))? else {
        return Ok(Outcome::Vanished);
    };
    let size = meta.len();

    let entry = store.write(worker, RandomReader::new(rng), size)?;

    // A replacement that hashed to the reference's own name is the reference
    if entry.path != path {
        present(fs::remove_file(path))?;
    }
    Ok(Outcome::Done { read: 0, written: size })
}
