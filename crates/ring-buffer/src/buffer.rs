//! Ring Buffer Implementation

use crate::RingBufferError;

/// Fixed-capacity FIFO ring buffer
///
/// Items are kept in insertion order. Once `capacity` items are stored, every
/// push evicts the oldest one.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[Option<T>]>,
    /// Next write position
    head: usize,
    /// Number of occupied slots
    len: usize,
    /// Total items pushed (for statistics)
    total_pushed: u64,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Ok(Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            len: 0,
            total_pushed: 0,
        })
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        let evicted = self.storage[self.head].replace(item);
        self.head = (self.head + 1) % capacity;
        self.total_pushed += 1;

        if self.len < capacity {
            self.len += 1;
        }
        evicted
    }

    /// Number of items currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Total items ever pushed, including evicted ones
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Iterate oldest-first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |i| self.storage[(start + i) % capacity].as_ref())
    }

    /// The most recent `count` items, oldest-first
    pub fn recent(&self, count: usize) -> Vec<&T> {
        let skip = self.len.saturating_sub(count);
        self.iter().skip(skip).collect()
    }

    /// Clear the buffer (statistics are kept)
    pub fn clear(&mut self) {
        for slot in self.storage.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}
