//! Frame wire format: 4-byte big-endian length followed by the payload.
//!
//! ```text
//! +--------------------+-----------------------+
//! | length: uint32 BE  | payload: length bytes |
//! +--------------------+-----------------------+
//! ```

pub mod demux;
pub mod encode;

pub use demux::Demultiplexer;
pub use encode::{encode, encode_into, encode_str};

/// Length header size in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload the length header can describe.
pub const MAX_PAYLOAD_LEN: u32 = u32::MAX;

/// Reads the declared payload length from the front of `buf` without
/// consuming anything. Returns `None` until a whole header is present.
#[inline]
pub fn peek_length(buf: &[u8]) -> Option<u32> {
    let header: [u8; HEADER_LEN] = buf.get(..HEADER_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(header))
}
