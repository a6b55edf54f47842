//! Fixed-size grouping of the record stream
//!
//! The batcher pulls from its upstream only when asked for the next batch and
//! never holds more than one batch of records. It never yields an empty batch:
//! when the input length is a multiple of the batch size, iteration simply ends.

use std::num::NonZeroUsize;

use crate::types::{Batch, Record};

/// Batch size used when none is configured
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(n) => n,
    None => panic!("default batch size is zero"),
};

/// Upper bound on the up-front buffer reservation for huge batch sizes
const MAX_PREALLOC: usize = 4096;

/// Groups a fallible record stream into batches.
///
/// An upstream error is passed through immediately and ends the iteration;
/// records buffered for the unfinished batch are discarded.
pub struct Batcher<I> {
    inner: I,
    size: NonZeroUsize,
    finished: bool,
}

impl<I> Batcher<I> {
    pub fn new(inner: I, size: NonZeroUsize) -> Self {
        Self {
            inner,
            size,
            finished: false,
        }
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.size
    }

    /// Borrow the upstream iterator, e.g. to read its statistics
    pub fn get_ref(&self) -> &I {
        &self.inner
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I, E> Iterator for Batcher<I>
where
    I: Iterator<Item = Result<Record, E>>,
{
    type Item = Result<Batch, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let size = self.size.get();
        let mut records = Vec::with_capacity(size.min(MAX_PREALLOC));
        while records.len() < size {
            match self.inner.next() {
                Some(Ok(record)) => records.push(record),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        // Only empty when the input ran out exactly on a batch boundary
        Batch::new(records).ok().map(Ok)
    }
}

/// Adapter for `iter.batches(size)`
pub trait IntoBatches: Sized {
    fn batches(self, size: NonZeroUsize) -> Batcher<Self>;
}

impl<I, E> IntoBatches for I
where
    I: Iterator<Item = Result<Record, E>>,
{
    fn batches(self, size: NonZeroUsize) -> Batcher<Self> {
        Batcher::new(self, size)
    }
}
