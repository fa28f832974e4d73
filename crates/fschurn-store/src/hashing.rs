//! Stream decorator that digests bytes as they pass through.

use std::io::{self, Read, Write};

use crate::digest::{Digest, DigestAlgorithm, Hasher};

/// Wraps a reader or writer and feeds every transferred byte to a hasher.
///
/// Only bytes that actually crossed the inner stream are hashed: a short
/// read hashes what was returned, a partial write hashes what the sink
/// accepted.
#[derive(Debug)]
pub struct HashingStream<S> {
    inner: S,
    hasher: Hasher,
    bytes: u64,
}

impl<S> HashingStream<S> {
    pub fn new(inner: S, algorithm: DigestAlgorithm) -> Self {
        Self {
            inner,
            hasher: algorithm.hasher(),
            bytes: 0,
        }
    }

    /// Digest of everything transferred so far. The stream stays usable.
    pub fn digest(&self) -> Digest {
        self.hasher.clone().finalize()
    }

    /// Number of bytes transferred so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Consume the stream, returning the inner stream and the final digest.
    pub fn finish(self) -> (S, Digest) {
        (self.inner, self.hasher.finalize())
    }

    fn record(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes += data.len() as u64;
    }
}

impl<R: Read> Read for HashingStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.record(&buf[..n]);
        Ok(n)
    }
}

impl<W: Write> Write for HashingStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.record(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
