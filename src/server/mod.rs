//! Framed TCP server.

pub mod builder;
pub mod connection;
pub mod handler;
pub mod registry;

pub use builder::FrameServer;
pub use connection::Connection;
pub use handler::{ConnectionId, ConnectionInfo, EchoHandler, MessageHandler};
pub use registry::ConnectionRegistry;
