//! Framed I/O over tokio byte streams.

pub mod reader;
pub mod writer;

pub use reader::FrameReader;
pub use writer::FrameWriter;
