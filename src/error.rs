//! Error types for length-prefixed framing.

use std::fmt;
use std::io;

/// Errors that can occur while encoding, decoding, or transporting frames.
///
/// Every variant is terminal for the connection it came from. Nothing here is
/// retried or partially recovered.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("payload of {len} bytes does not fit a 32-bit length header")]
    Oversize { len: usize },

    #[error("declared frame length {declared} exceeds limit {limit}")]
    OversizeFrame { declared: u32, limit: u32 },

    #[error("stream ended mid-frame with {buffered} bytes buffered")]
    TruncatedStream { buffered: usize },

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("handler error: {0}")]
    Handler(String),

    #[error("connection limit ({limit}) reached")]
    ConnectionLimit { limit: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FrameError>;

impl FrameError {
    /// Wraps any displayable error as a handler error.
    pub fn handler(e: impl fmt::Display) -> Self {
        Self::Handler(e.to_string())
    }

    /// Classifies this error as a reason for the connection going away.
    pub fn disconnect(&self) -> Disconnect {
        match self {
            Self::Transport(e) => match e.kind() {
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe => Disconnect::Reset,
                _ => Disconnect::Transport,
            },
            Self::TruncatedStream { .. } => Disconnect::Truncated,
            Self::OversizeFrame { .. } | Self::InvalidUtf8(_) => Disconnect::ProtocolViolation,
            Self::Oversize { .. } | Self::Handler(_) => Disconnect::Aborted,
            Self::ConnectionLimit { .. } => Disconnect::Refused,
        }
    }
}

/// Why a framed connection stopped.
///
/// A clean close only happens when the peer shuts down between frames; every
/// other variant comes from a [`FrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    Clean,
    Reset,
    Truncated,
    ProtocolViolation,
    Transport,
    Refused,
    Aborted,
}

impl Disconnect {
    /// `true` only for an orderly shutdown between frames.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

impl fmt::Display for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Clean => "peer closed the connection",
            Self::Reset => "connection reset by peer",
            Self::Truncated => "peer closed the connection in the middle of a message",
            Self::ProtocolViolation => "peer violated the framing protocol",
            Self::Transport => "connection failed",
            Self::Refused => "connection refused: server at capacity",
            Self::Aborted => "connection aborted locally",
        };
        f.write_str(msg)
    }
}
