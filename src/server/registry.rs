//! Live connection tracking and capacity limits.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::error::{FrameError, Result};
use crate::server::handler::{ConnectionId, ConnectionInfo};

/// Tracked state for a single connection.
pub struct ConnectionEntry {
    pub accepted_at: Instant,
}

/// Registry of open connections, shared by the accept loop and the
/// connection tasks.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
    max_connections: Option<usize>,
}

impl ConnectionRegistry {
    pub fn new(max_connections: Option<usize>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            max_connections,
        }
    }

    /// Registers a new connection. Fails if the capacity limit is reached.
    pub fn register(&self, peer_addr: SocketAddr) -> Result<ConnectionInfo> {
        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(limit) = self.max_connections
            && connections.len() >= limit
        {
            return Err(FrameError::ConnectionLimit { limit });
        }
        let id = ConnectionId::new();
        connections.insert(
            id,
            ConnectionEntry {
                accepted_at: Instant::now(),
            },
        );
        Ok(ConnectionInfo { id, peer_addr })
    }

    /// Removes a connection and returns how long it was open.
    pub fn remove(&self, id: &ConnectionId) -> Option<Duration> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .map(|entry| entry.accepted_at.elapsed())
    }

    /// Returns the number of open connections.
    pub fn count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
