//! Video frame types

/// Grayscale or RGB frame handed to the geometry extractor
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    /// Pixel data (may be empty for replayed sessions)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds, monotonic)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw pixel data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Frame with no pixel payload, used when only timing matters
    pub fn blank(width: u32, height: u32, timestamp_ns: u64, sequence: u64) -> Self {
        Self::new(Vec::new(), width, height, timestamp_ns, sequence)
    }

    /// Capture timestamp in seconds
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1e9
    }
}
