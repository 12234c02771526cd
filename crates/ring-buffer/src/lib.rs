//! Bounded Ring Buffer
//!
//! Fixed-capacity FIFO storage used for the recent-event log. Pushing into a
//! full buffer evicts the oldest entry.

mod buffer;

pub use buffer::RingBuffer;

use thiserror::Error;

/// Ring buffer errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("Ring buffer capacity must be at least 1")]
    ZeroCapacity,
}
