//! Reads framed messages from an async byte stream.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::frame::Demultiplexer;

/// Reads length-prefixed messages from an `AsyncRead` stream.
///
/// Payloads completed by one transport read are handed out one at a time;
/// the next read only happens once they have all been taken.
pub struct FrameReader<R> {
    reader: R,
    demux: Demultiplexer,
    chunk: Vec<u8>,
    ready: VecDeque<Bytes>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &FrameConfig::default())
    }

    pub fn with_config(reader: R, config: &FrameConfig) -> Self {
        Self {
            reader,
            demux: Demultiplexer::with_max_frame_size(config.max_frame_size),
            chunk: vec![0; config.read_chunk_size.max(1)],
            ready: VecDeque::new(),
        }
    }

    /// Returns the next payload, or `None` when the peer closed the stream
    /// cleanly between frames.
    ///
    /// # Errors
    ///
    /// - [`FrameError::TruncatedStream`] if the stream ends mid-frame.
    /// - [`FrameError::OversizeFrame`] if the peer declares a frame above the ceiling.
    /// - [`FrameError::Transport`] for any I/O failure; buffered bytes are abandoned.
    pub async fn recv(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(payload) = self.ready.pop_front() {
                return Ok(Some(payload));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                self.demux.finish()?;
                return Ok(None);
            }

            let payloads = self.demux.feed(&self.chunk[..n])?;
            tracing::trace!(
                read = n,
                frames = payloads.len(),
                buffered = self.demux.buffered_len(),
                "fed chunk",
            );
            self.ready.extend(payloads);
        }
    }

    /// Like [`recv`](Self::recv), decoding the payload as UTF-8.
    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        match self.recv().await? {
            Some(payload) => {
                let text = std::str::from_utf8(&payload).map_err(FrameError::from)?;
                Ok(Some(text.to_owned()))
            }
            None => Ok(None),
        }
    }

    /// The demultiplexer holding this reader's partial frame.
    pub fn demultiplexer(&self) -> &Demultiplexer {
        &self.demux
    }

    /// Gives back the underlying stream, dropping any buffered bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
