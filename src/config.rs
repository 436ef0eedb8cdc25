//! Framing configuration.

/// Default ceiling on a single frame's declared payload length (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Default number of bytes requested from the transport per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Default depth of a server connection's outbound reply queue.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 64;

/// Tunables shared by readers, writers, the client, and the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Largest declared payload length accepted from a peer.
    pub max_frame_size: u32,
    /// Size of each transport read.
    pub read_chunk_size: usize,
    /// Bounded reply queue between a server connection's read loop and its writer.
    pub outbound_queue: usize,
}

impl FrameConfig {
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }

    /// Sets the frame ceiling.
    pub fn max_frame_size(mut self, limit: u32) -> Self {
        self.max_frame_size = limit;
        self
    }

    /// Sets the transport read size. Zero is bumped to one byte.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Sets the outbound queue depth. Zero is bumped to one slot.
    pub fn outbound_queue(mut self, depth: usize) -> Self {
        self.outbound_queue = depth.max(1);
        self
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::new()
    }
}
