//! Generated content for new store entries.

use std::io::{self, Read};

use rand::RngCore;

/// Endless stream of pseudo-random bytes drawn from `R`.
///
/// Pair it with [`Read::take`] to bound the length. Passing `&mut rng`
/// keeps the generator's state advancing across calls.
#[derive(Debug)]
pub struct RandomReader<R> {
    rng: R,
}

impl<R: RngCore> RandomReader<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> Read for RandomReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.rng.fill_bytes(buf);
        Ok(buf.len())
    }
}
