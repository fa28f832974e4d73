//! # fschurn-store
//!
//! Content-addressable file store used by the fschurn exercise tools.
//!
//! Every committed file is named after the digest of its own bytes and
//! sharded by the first 4 hex characters of that digest.
//!
//! ## Directory Layout
//!
//! ```text
//! <root>/
//! ├── staging/
//! │   └── 0003            # in-flight write owned by worker 3
//! └── 9f86/
//!     └── 9f86d081...     # basename == digest(contents)
//! ```
//!
//! New entries are streamed into the writer's staging slot, hashed on the
//! way, and renamed into place only once complete. A digest-named path is
//! never written directly, so readers never observe a partial entry.

pub mod digest;
pub mod hashing;
pub mod source;
pub mod testing;

pub use digest::{Digest, DigestAlgorithm, Hasher, SHARD_LEN};
pub use hashing::HashingStream;
pub use source::RandomReader;

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Name of the reserved staging directory under the store root.
pub const STAGING_DIR: &str = "staging";

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("content source ended early: wrote {written} of {expected} bytes")]
    ShortSource { expected: u64, written: u64 },
}

impl StoreError {
    /// The target vanished underneath us; callers treat this as benign.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store behaviour knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Hash function used to name entries
    pub algorithm: DigestAlgorithm,
    /// fsync staging files before they are renamed into place
    pub fsync: bool,
}

/// A committed, digest-named file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub path: PathBuf,
    pub digest: Digest,
    pub size: u64,
}

/// Result of re-hashing a file and comparing against its name.
///
/// A mismatch means corruption, or a file that was never a store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Basename of the verified file
    pub name: String,
    /// Digest of the bytes actually read
    pub actual: Digest,
    /// Number of bytes read
    pub bytes: u64,
}

impl Verification {
    pub fn is_intact(&self) -> bool {
        self.actual.matches_name(&self.name)
    }
}

/// Content-addressable store rooted at a directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    options: StoreOptions,
}

impl ContentStore {
    /// Create a handle for the store at `root`. Touches nothing on disk.
    pub fn new<P: AsRef<Path>>(root: P, options: StoreOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Create the staging directory if it is not there yet.
    pub fn prepare(&self) -> Result<()> {
        match fs::create_dir(self.staging_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.options.algorithm
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Staging slot owned by `worker`. Distinct workers never share one.
    pub fn staging_path(&self, worker: usize) -> PathBuf {
        self.staging_dir().join(format!("{:04}", worker))
    }

    /// Final location of an entry: `root/<shard>/<hex>`.
    pub fn entry_path(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.shard()).join(digest.to_hex())
    }

    /// Stream exactly `size` bytes from `source` into a new entry.
    ///
    /// The bytes land in the worker's staging slot first and are renamed to
    /// their digest-named path once fully written. On any failure the staging
    /// file is removed and nothing appears under a digest-named path.
    #[instrument(skip(self, source), level = "debug")]
    pub fn write<R: Read>(&self, worker: usize, source: R, size: u64) -> Result<StoreEntry> {
        let staging = self.staging_path(worker);
        let file = File::create(&staging)?;

        match self.commit(file, &staging, source, size) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                // Best effort: the staging slot is reused by this worker's next write anyway
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn commit<R: Read>(
        &self,
        file: File,
        staging: &Path,
        source: R,
        size: u64,
    ) -> Result<StoreEntry> {
        let mut stream = HashingStream::new(file, self.options.algorithm);
        let written = io::copy(&mut source.take(size), &mut stream)?;
        if written != size {
            return Err(StoreError::ShortSource {
                expected: size,
                written,
            });
        }
        stream.flush()?;

        let (file, digest) = stream.finish();
        if self.options.fsync {
            file.sync_all()?;
        }
        drop(file);

        let shard = self.root.join(digest.shard());
        match fs::create_dir(&shard) {
            Ok(()) => {}
            // Concurrent writers race to create the same shard
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let path = shard.join(digest.to_hex());
        fs::rename(staging, &path)?;

        tracing::debug!(entry = %path.display(), size, "committed store entry");
        Ok(StoreEntry { path, digest, size })
    }

    /// Re-hash the file at `path` and compare with its basename.
    pub fn verify<P: AsRef<Path>>(&self, path: P) -> Result<Verification> {
        verify_file(path.as_ref(), self.options.algorithm)
    }

    /// Verify the committed entry for `digest`.
    pub fn verify_entry(&self, digest: &Digest) -> Result<Verification> {
        self.verify(self.entry_path(digest))
    }
}

/// Stream the file through a hasher and compare against its basename.
///
/// Not-found and other I/O failures propagate as errors; a mismatch is a
/// successful result describing what was found.
pub fn verify_file(path: &Path, algorithm: DigestAlgorithm) -> Result<Verification> {
    let file = File::open(path)?;
    let mut stream = HashingStream::new(file, algorithm);
    io::copy(&mut stream, &mut io::sink())?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Verification {
        name,
        actual: stream.digest(),
        bytes: stream.bytes_hashed(),
    })
}
