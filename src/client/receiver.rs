//! Receive loop for the read half of a framed connection.

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::error::Disconnect;
use crate::stream::FrameReader;

/// Hands every incoming payload to `on_message` until the stream ends, then
/// reports why it ended.
///
/// A clean close, a reset, and a protocol violation come back as distinct
/// [`Disconnect`] values so a terminal front end can say which one happened.
pub async fn receive_loop<R, F>(reader: &mut FrameReader<R>, mut on_message: F) -> Disconnect
where
    R: AsyncRead + Unpin,
    F: FnMut(Bytes),
{
    loop {
        match reader.recv().await {
            Ok(Some(payload)) => on_message(payload),
            Ok(None) => {
                tracing::debug!("peer closed the connection");
                return Disconnect::Clean;
            }
            Err(e) => {
                let reason = e.disconnect();
                tracing::debug!(error = %e, %reason, "receive loop stopped");
                return reason;
            }
        }
    }
}
