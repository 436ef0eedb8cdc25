//! The `MessageHandler` trait — application logic behind a framed server.

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::{Disconnect, Result};

/// Opaque identifier for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identity of the connection a handler call belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
}

/// Application callbacks invoked by the server, one connection at a time.
///
/// Calls for a single connection are strictly sequential. Calls for
/// different connections run concurrently.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Called once after the connection is accepted. Returning an error
    /// closes it before any frame is read.
    async fn on_connect(&self, _conn: &ConnectionInfo) -> Result<()> {
        Ok(())
    }

    /// Handles one decoded payload and returns the replies to send back,
    /// in order. An error closes the connection.
    async fn on_message(&self, conn: &ConnectionInfo, payload: Bytes) -> Result<Vec<Bytes>>;

    /// Called once when the connection is gone.
    async fn on_disconnect(&self, _conn: &ConnectionInfo, _reason: Disconnect) {}
}

/// Replies to every message with the same payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

#[async_trait::async_trait]
impl MessageHandler for EchoHandler {
    async fn on_message(&self, conn: &ConnectionInfo, payload: Bytes) -> Result<Vec<Bytes>> {
        tracing::trace!(connection_id = %conn.id, len = payload.len(), "echo");
        Ok(vec![payload])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ConnectionInfo {
        ConnectionInfo {
            id: ConnectionId::new(),
            peer_addr: "127.0.0.1:9000".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn echo_returns_payload_unchanged() {
        let payload = Bytes::from_static(b"\x00\xFFraw");
        let replies = EchoHandler.on_message(&info(), payload.clone()).await.unwrap();
        assert_eq!(replies, vec![payload]);
    }

    #[tokio::test]
    async fn default_on_connect_accepts() {
        assert!(EchoHandler.on_connect(&info()).await.is_ok());
    }

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
