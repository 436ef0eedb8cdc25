//! Frame encoding.

use bytes::{BufMut, Bytes, BytesMut};

use super::HEADER_LEN;
use crate::error::{FrameError, Result};

/// Encodes `payload` as one frame: big-endian length header, then the
/// payload bytes unchanged.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    encode_into(&mut buf, payload)?;
    Ok(buf.freeze())
}

/// Appends one frame for `payload` to `dst`.
///
/// `dst` is left untouched on error.
pub fn encode_into(dst: &mut BytesMut, payload: &[u8]) -> Result<()> {
    let len = header_value(payload.len())?;
    dst.reserve(HEADER_LEN + payload.len());
    dst.put_u32(len);
    dst.extend_from_slice(payload);
    Ok(())
}

/// Encodes UTF-8 text as one frame.
pub fn encode_str(text: &str) -> Result<Bytes> {
    encode(text.as_bytes())
}

fn header_value(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FrameError::Oversize { len })
}
