use std::ops::Range;

/// A contiguous run of the caller's messages sent as one transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Splits a message list into ordered chunks.
///
/// Chunks are index ranges into the caller's slice, so concatenating the
/// chunks of a plan always yields the original messages in their original
/// order. When a chunk turns out too large, only the messages that were not
/// broadcast yet are replanned, with a smaller bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchPlanner;

impl BatchPlanner {
    /// Partitions `start..len` into chunks of `max_count` messages, the last
    /// one holding the remainder. A `max_count` of zero is treated as one.
    pub fn plan(len: usize, start: usize, max_count: usize) -> Vec<Chunk> {
        let max_count = max_count.max(1);
        (start..len)
            .step_by(max_count)
            .map(|from| Chunk::new(from, (from + max_count).min(len)))
            .collect()
    }

    /// The next smaller chunk bound, or `None` if a single message is
    /// already too large
    pub fn shrink(current: usize) -> Option<usize> {
        (current > 1).then(|| current - 1)
    }
}
