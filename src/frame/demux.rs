//! Incremental frame parser for arbitrarily chunked input.

use bytes::{Bytes, BytesMut};

use super::{HEADER_LEN, MAX_PAYLOAD_LEN, peek_length};
use crate::config::DEFAULT_MAX_FRAME_SIZE;
use crate::error::{FrameError, Result};

const INITIAL_CAPACITY: usize = 4 * 1024;

/// Reassembles frame payloads from chunks whose boundaries are unrelated to
/// frame boundaries.
///
/// Owns the receive buffer for one connection. Between calls to
/// [`feed`](Self::feed) the buffer holds nothing, a partial header, or a full
/// header plus part of its body, never a whole frame.
#[derive(Debug)]
pub struct Demultiplexer {
    buf: BytesMut,
    max_frame_size: u32,
}

impl Demultiplexer {
    /// Creates a demultiplexer with the default frame ceiling.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates a demultiplexer rejecting frames that declare more than
    /// `limit` payload bytes.
    pub fn with_max_frame_size(limit: u32) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
            max_frame_size: limit,
        }
    }

    /// Creates a demultiplexer that accepts any length the header can express.
    pub fn unbounded() -> Self {
        Self::with_max_frame_size(MAX_PAYLOAD_LEN)
    }

    /// Appends `chunk` and returns every payload it completes, in order.
    ///
    /// Leftover bytes stay buffered for the next call. An empty chunk returns
    /// an empty vector and changes nothing.
    ///
    /// # Errors
    ///
    /// [`FrameError::OversizeFrame`] as soon as a header declares more than the
    /// configured ceiling. The instance should be dropped with its connection.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(payload) = self.next_payload()? {
            payloads.push(payload);
        }
        Ok(payloads)
    }

    /// Checks that the stream may end here.
    ///
    /// Call once the transport reports end-of-stream. A peer that closes
    /// between frames leaves the buffer empty; anything else was cut off.
    pub fn finish(&self) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(FrameError::TruncatedStream {
                buffered: self.buf.len(),
            })
        }
    }

    /// Number of bytes held for an incomplete frame.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    /// Declared payload length of the frame being assembled, once its header
    /// has fully arrived.
    pub fn pending_frame_len(&self) -> Option<u32> {
        peek_length(&self.buf)
    }

    fn next_payload(&mut self) -> Result<Option<Bytes>> {
        let Some(declared) = peek_length(&self.buf) else {
            return Ok(None);
        };

        if declared > self.max_frame_size {
            return Err(FrameError::OversizeFrame {
                declared,
                limit: self.max_frame_size,
            });
        }

        let frame_len = (declared as usize).saturating_add(HEADER_LEN);
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(frame_len);
        let payload = frame.split_off(HEADER_LEN).freeze();
        Ok(Some(payload))
    }
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Self::new()
    }
}
