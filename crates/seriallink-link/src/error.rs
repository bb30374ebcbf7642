use std::time::Duration;

use seriallink_frame::{FrameError, MessageKind};
use seriallink_transport::TransportError;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The outgoing queue is saturated; the message was not enqueued.
    #[error("outgoing queue is full ({capacity} messages)")]
    QueueFull { capacity: usize },

    /// No matching response arrived within the request window.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// `reply` was given something other than a request.
    #[error("cannot reply to a {0} message")]
    NotARequest(MessageKind),

    /// `serve` is already running on this link.
    #[error("link is already serving a transport")]
    AlreadyServing,

    /// The link has been shut down.
    #[error("link is shut down")]
    Shutdown,

    /// A listener queue closed while a request was waiting on it.
    #[error("listener closed before a response arrived")]
    ListenerClosed,

    /// Fatal frame-level error surfaced by the reader or writer task.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
