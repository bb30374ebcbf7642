//! The writer and reader loops bound to one transport.

use std::sync::Arc;

use futures_util::StreamExt;
use seriallink_frame::{LineReader, LineWriter, Message};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::registry::ListenerRegistry;

/// Drain `outgoing` into `writer` until cancelled or the transport fails.
///
/// Messages still queued on cancellation are abandoned.
pub(crate) async fn writer_loop<W>(
    mut writer: LineWriter<W>,
    outgoing: &mut mpsc::Receiver<Message>,
    token: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("writer cancelled");
                return Ok(());
            }
            message = outgoing.recv() => match message {
                Some(message) => message,
                // The link holds a sender for as long as it lives.
                None => return Ok(()),
            },
        };

        let (kind, id) = (message.kind, message.id);
        match writer.send(message).await {
            Ok(()) => tracing::debug!(%kind, id, "message written"),
            Err(err) if err.is_fatal() => {
                tracing::error!(error = %err, "write failed");
                return Err(err.into());
            }
            Err(err) => {
                tracing::warn!(%kind, id, error = %err, "dropping unencodable message");
            }
        }
    }
}

/// Decode incoming lines and broadcast them until cancelled or end of stream.
pub(crate) async fn reader_loop<R>(
    mut reader: LineReader<R>,
    registry: Arc<ListenerRegistry>,
    token: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    loop {
        let item = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("reader cancelled");
                return Ok(());
            }
            item = reader.next() => item,
        };

        match item {
            None => {
                tracing::info!("end of stream");
                return Ok(());
            }
            Some(Ok(message)) => {
                let delivered = registry.broadcast(&message);
                tracing::debug!(
                    kind = %message.kind,
                    id = message.id,
                    listeners = delivered,
                    "message received"
                );
            }
            Some(Err(err)) if err.is_fatal() => {
                tracing::error!(error = %err, "read failed");
                return Err(err.into());
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "skipping malformed line");
            }
        }
    }
}
