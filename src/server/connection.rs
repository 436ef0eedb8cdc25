//! Per-connection read loop and writer task.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::config::FrameConfig;
use crate::error::{Disconnect, FrameError, Result};
use crate::server::handler::{ConnectionInfo, MessageHandler};
use crate::stream::{FrameReader, FrameWriter};

/// Drives one framed connection until it closes.
///
/// The read half runs on the calling task and feeds the handler. Replies go
/// through a bounded queue to a writer task that owns the write half, so a
/// slow peer stalls the read loop instead of growing memory.
pub struct Connection<R, W, H> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    handler: Arc<H>,
    info: ConnectionInfo,
    outbound_queue: usize,
}

impl<R, W, H> Connection<R, W, H>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    H: MessageHandler,
{
    pub fn new(
        reader: R,
        writer: W,
        handler: Arc<H>,
        info: ConnectionInfo,
        config: &FrameConfig,
    ) -> Self {
        Self {
            reader: FrameReader::with_config(reader, config),
            writer: FrameWriter::new(writer),
            handler,
            info,
            outbound_queue: config.outbound_queue.max(1),
        }
    }

    /// Runs the connection lifecycle and reports why it ended.
    pub async fn run(self) -> Disconnect {
        let Self {
            mut reader,
            writer,
            handler,
            info,
            outbound_queue,
        } = self;

        if let Err(e) = handler.on_connect(&info).await {
            let reason = e.disconnect();
            tracing::debug!(connection_id = %info.id, error = %e, "connection rejected by handler");
            handler.on_disconnect(&info, reason).await;
            return reason;
        }

        let (tx, rx) = mpsc::channel(outbound_queue);
        let writer_task = tokio::spawn(write_loop(writer, rx));

        let read_result = read_loop(&mut reader, handler.as_ref(), &info, &tx).await;
        drop(tx);

        let reason = match read_result {
            Err(e) => {
                // Queued replies are discarded; the peer may have stopped reading.
                writer_task.abort();
                let _ = writer_task.await;
                log_failure(&info, &e);
                e.disconnect()
            }
            Ok(()) => match writer_task.await {
                Ok(Ok(())) => Disconnect::Clean,
                Ok(Err(e)) => {
                    log_failure(&info, &e);
                    e.disconnect()
                }
                Err(e) => {
                    let e = FrameError::Transport(std::io::Error::other(e));
                    log_failure(&info, &e);
                    e.disconnect()
                }
            },
        };

        tracing::debug!(
            connection_id = %info.id,
            peer_addr = %info.peer_addr,
            %reason,
            "connection closed",
        );
        handler.on_disconnect(&info, reason).await;
        reason
    }
}

async fn read_loop<R, H>(
    reader: &mut FrameReader<R>,
    handler: &H,
    info: &ConnectionInfo,
    tx: &mpsc::Sender<Bytes>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    H: MessageHandler,
{
    while let Some(payload) = reader.recv().await? {
        tracing::trace!(connection_id = %info.id, len = payload.len(), "received frame");
        for reply in handler.on_message(info, payload).await? {
            // The writer only hangs up after a write failure, which it reports itself.
            if tx.send(reply).await.is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn write_loop<W>(mut writer: FrameWriter<W>, mut rx: mpsc::Receiver<Bytes>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(payload) = rx.recv().await {
        writer.write_frame(&payload).await?;
        if rx.is_empty() {
            writer.flush().await?;
        }
    }
    writer.shutdown().await
}

fn log_failure(info: &ConnectionInfo, e: &FrameError) {
    match e {
        FrameError::OversizeFrame { .. } | FrameError::InvalidUtf8(_) => {
            tracing::warn!(connection_id = %info.id, peer_addr = %info.peer_addr, error = %e, "protocol violation");
        }
        _ => {
            tracing::debug!(connection_id = %info.id, error = %e, "connection error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::handler::{ConnectionId, EchoHandler};
    use tokio::io::{AsyncWriteExt, duplex};

    fn info() -> ConnectionInfo {
        ConnectionInfo {
            id: ConnectionId::new(),
            peer_addr: "127.0.0.1:9000".parse().unwrap(),
        }
    }

    fn spawn_echo(
        config: FrameConfig,
    ) -> (tokio::io::DuplexStream, tokio::task::JoinHandle<Disconnect>) {
        let (client, server) = duplex(64);
        let (rh, wh) = tokio::io::split(server);
        let conn = Connection::new(rh, wh, Arc::new(EchoHandler), info(), &config);
        (client, tokio::spawn(conn.run()))
    }

    #[tokio::test]
    async fn echoes_frames_and_closes_cleanly() {
        let (client, task) = spawn_echo(FrameConfig::default());
        let (rh, wh) = tokio::io::split(client);
        let mut reader = FrameReader::new(rh);
        let mut writer = FrameWriter::new(wh);

        writer
            .send_batch(["hello, server!", "第二条消息", "第三条"])
            .await
            .unwrap();
        assert_eq!(reader.recv_text().await.unwrap().unwrap(), "hello, server!");
        assert_eq!(reader.recv_text().await.unwrap().unwrap(), "第二条消息");
        assert_eq!(reader.recv_text().await.unwrap().unwrap(), "第三条");

        writer.shutdown().await.unwrap();
        assert!(reader.recv().await.unwrap().is_none());
        assert_eq!(task.await.unwrap(), Disconnect::Clean);
    }

    #[tokio::test]
    async fn truncated_input_is_reported() {
        let (mut client, task) = spawn_echo(FrameConfig::default());
        client.write_all(&[0x00, 0x00, 0x00, 0x08, b'x']).await.unwrap();
        client.shutdown().await.unwrap();
        assert_eq!(task.await.unwrap(), Disconnect::Truncated);
    }

    #[tokio::test]
    async fn oversize_frame_is_a_protocol_violation() {
        let (mut client, task) = spawn_echo(FrameConfig::new().max_frame_size(4));
        client.write_all(&[0x00, 0x00, 0x00, 0x05]).await.unwrap();
        assert_eq!(task.await.unwrap(), Disconnect::ProtocolViolation);
    }

    #[tokio::test]
    async fn violation_closes_even_when_peer_never_reads() {
        let config = FrameConfig::new().outbound_queue(1000).max_frame_size(1024);
        let (mut client, task) = spawn_echo(config);

        // Enough echo traffic to fill the pipe back to a peer that never reads.
        for _ in 0..20 {
            let mut frame = vec![0x00, 0x00, 0x00, 0x10];
            frame.extend_from_slice(&[0xAB; 16]);
            client.write_all(&frame).await.unwrap();
        }
        client.write_all(&[0xFF, 0xFF, 0xFF, 0xFF]).await.unwrap();

        let reason = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("connection still open after oversize frame")
            .unwrap();
        assert_eq!(reason, Disconnect::ProtocolViolation);
        drop(client);
    }

    #[tokio::test]
    async fn zero_outbound_queue_is_clamped() {
        let config = FrameConfig {
            outbound_queue: 0,
            ..FrameConfig::default()
        };
        let (client, task) = spawn_echo(config);
        let (rh, wh) = tokio::io::split(client);
        let mut reader = FrameReader::new(rh);
        let mut writer = FrameWriter::new(wh);

        writer.send_text("ping").await.unwrap();
        assert_eq!(reader.recv_text().await.unwrap().unwrap(), "ping");

        writer.shutdown().await.unwrap();
        assert!(reader.recv().await.unwrap().is_none());
        assert_eq!(task.await.unwrap(), Disconnect::Clean);
    }

    struct Failing;

    #[async_trait::async_trait]
    impl MessageHandler for Failing {
        async fn on_message(&self, _conn: &ConnectionInfo, _payload: Bytes) -> Result<Vec<Bytes>> {
            Err(FrameError::handler("rejected"))
        }
    }

    #[tokio::test]
    async fn handler_error_aborts_connection() {
        let (client, server) = duplex(64);
        let (rh, wh) = tokio::io::split(server);
        let conn = Connection::new(rh, wh, Arc::new(Failing), info(), &FrameConfig::default());
        let task = tokio::spawn(conn.run());

        let (crh, cwh) = tokio::io::split(client);
        let mut writer = FrameWriter::new(cwh);
        writer.send_text("anything").await.unwrap();
        assert_eq!(task.await.unwrap(), Disconnect::Aborted);

        let mut reader = FrameReader::new(crh);
        assert!(reader.recv().await.unwrap().is_none());
    }
}
