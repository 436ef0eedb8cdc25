//! Framed server builder and TCP listener.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::config::FrameConfig;
use crate::error::Result;
use crate::server::connection::Connection;
use crate::server::handler::MessageHandler;
use crate::server::registry::ConnectionRegistry;

/// Builder for configuring and starting a framed TCP server.
pub struct FrameServer<H: MessageHandler> {
    handler: H,
    config: FrameConfig,
    max_connections: Option<usize>,
    shutdown: Option<Pin<Box<dyn Future<Output = ()> + Send>>>,
}

impl<H: MessageHandler> FrameServer<H> {
    /// Creates a new server builder with the given handler.
    pub fn builder(handler: H) -> Self {
        Self {
            handler,
            config: FrameConfig::default(),
            max_connections: None,
            shutdown: None,
        }
    }

    /// Sets the framing configuration used for every connection.
    pub fn config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the maximum number of concurrent connections.
    pub fn max_connections(mut self, limit: usize) -> Self {
        self.max_connections = Some(limit);
        self
    }

    /// Sets a shutdown signal future.
    pub fn shutdown(mut self, signal: impl Future<Output = ()> + Send + 'static) -> Self {
        self.shutdown = Some(Box::pin(signal));
        self
    }

    /// Binds `addr` and serves until the shutdown signal fires.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<()> {
        let handler = Arc::new(self.handler);
        let registry = Arc::new(ConnectionRegistry::new(self.max_connections));
        let config = self.config;
        let mut shutdown: Pin<Box<dyn Future<Output = ()> + Send>> = match self.shutdown {
            Some(signal) => signal,
            None => Box::pin(std::future::pending()),
        };

        tracing::info!(addr = ?listener.local_addr().ok(), "framed server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            spawn_connection(stream, peer_addr, handler.clone(), registry.clone(), config);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept error");
                        }
                    }
                }
                () = &mut shutdown => {
                    tracing::info!(open = registry.count(), "framed server shutting down");
                    break;
                }
            }
        }

        tracing::info!("framed server stopped");
        Ok(())
    }
}

fn spawn_connection<H: MessageHandler>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<H>,
    registry: Arc<ConnectionRegistry>,
    config: FrameConfig,
) {
    let info = match registry.register(peer_addr) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(%peer_addr, error = %e, "refusing connection");
            return;
        }
    };

    tokio::spawn(async move {
        tracing::debug!(connection_id = %info.id, %peer_addr, "connection accepted");
        let (rh, wh) = stream.into_split();
        let conn = Connection::new(rh, wh, handler, info, &config);
        let reason = conn.run().await;
        let open_for = registry.remove(&info.id);
        tracing::debug!(connection_id = %info.id, %reason, ?open_for, "connection finished");
    });
}
