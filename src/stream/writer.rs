//! Writes framed messages to an async byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::frame::encode_into;

/// Writes length-prefixed messages to an `AsyncWrite` stream.
///
/// Reuses one encode buffer across messages.
pub struct FrameWriter<W> {
    writer: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: BytesMut::new(),
        }
    }

    /// Writes one frame without flushing.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_into(&mut self.buf, payload)?;
        self.writer.write_all(&self.buf).await?;
        tracing::trace!(len = payload.len(), "wrote frame");
        Ok(())
    }

    /// Writes one frame and flushes.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.write_frame(payload).await?;
        self.flush().await
    }

    /// Sends UTF-8 text as one frame.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(text.as_bytes()).await
    }

    /// Encodes every payload into a single write, then flushes.
    ///
    /// Nothing is written if any payload is oversize.
    pub async fn send_batch<I, P>(&mut self, payloads: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.buf.clear();
        for payload in payloads {
            encode_into(&mut self.buf, payload.as_ref())?;
        }
        self.writer.write_all(&self.buf).await?;
        self.flush().await
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Flushes and shuts down the write direction, signalling a clean close.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Gives back the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
