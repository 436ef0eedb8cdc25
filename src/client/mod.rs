//! Framed TCP client.
//!
//! Feature-gated behind `client`.

mod connection;
mod receiver;

pub use connection::FrameClient;
pub use receiver::receive_loop;
