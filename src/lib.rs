//! lpframe — length-prefixed message framing over byte streams.
//!
//! A stream transport such as TCP delivers bytes in chunks that have nothing
//! to do with application message boundaries. This crate puts a 4-byte
//! big-endian length in front of every message and reassembles messages on
//! the receiving side, whether a read contains several of them or only a
//! piece of one.
//!
//! # Architecture
//!
//! - **`frame`** — Wire format: the encoder and the incremental `Demultiplexer`
//! - **`stream`** — `FrameReader` / `FrameWriter` over tokio `AsyncRead` / `AsyncWrite`
//! - **`config`** — Frame ceiling and buffer sizing
//! - **`server`** — TCP server with a `MessageHandler` trait
//! - **`client`** — TCP client with split read/write halves (feature-gated)

pub mod config;
pub mod error;
pub mod frame;
pub mod server;
pub mod stream;

#[cfg(feature = "client")]
pub mod client;

pub use config::FrameConfig;
pub use error::{Disconnect, FrameError, Result};
pub use frame::{Demultiplexer, encode, encode_into, encode_str};
pub use stream::{FrameReader, FrameWriter};
