//! Framed TCP connection: connect, send, receive.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::config::FrameConfig;
use crate::error::Result;
use crate::stream::{FrameReader, FrameWriter};

/// A client connection exchanging length-prefixed messages over TCP.
pub struct FrameClient {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: SocketAddr,
}

impl FrameClient {
    /// Connects with the default configuration.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, &FrameConfig::default()).await
    }

    /// Connects to `addr` and prepares framed read and write halves.
    pub async fn connect_with_config(addr: SocketAddr, config: &FrameConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let peer_addr = stream.peer_addr()?;
        tracing::debug!(%peer_addr, "connected");

        let (rh, wh) = stream.into_split();
        Ok(Self {
            reader: FrameReader::with_config(rh, config),
            writer: FrameWriter::new(wh),
            peer_addr,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Sends one message.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.writer.send(payload).await
    }

    /// Sends UTF-8 text as one message.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.writer.send_text(text).await
    }

    /// Sends several messages back-to-back in a single write.
    pub async fn send_batch<I, P>(&mut self, payloads: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.writer.send_batch(payloads).await
    }

    /// Receives the next message; `None` once the server closed cleanly.
    pub async fn recv(&mut self) -> Result<Option<Bytes>> {
        self.reader.recv().await
    }

    /// Receives the next message as UTF-8 text.
    pub async fn recv_text(&mut self) -> Result<Option<String>> {
        self.reader.recv_text().await
    }

    /// Splits into independent halves so receiving and sending can run on
    /// separate tasks.
    pub fn into_split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }

    /// Shuts down the write direction. The server sees a clean close.
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await
    }
}
