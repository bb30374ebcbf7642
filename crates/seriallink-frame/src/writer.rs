use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Sink, SinkExt};
use pin_project_lite::pin_project;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;

use crate::codec::{FrameConfig, LineCodec};
use crate::error::{FrameError, Result};
use crate::message::Message;

pin_project! {
    /// Writes messages as terminated lines to any `AsyncWrite` destination.
    pub struct LineWriter<W> {
        #[pin]
        inner: FramedWrite<W, LineCodec>,
    }
}

impl<W: AsyncWrite> LineWriter<W> {
    /// Create a new line writer with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, &FrameConfig::default())
    }

    /// Create a new line writer with explicit configuration.
    pub fn with_config(inner: W, config: &FrameConfig) -> Self {
        Self {
            inner: FramedWrite::new(inner, LineCodec::with_config(config)),
        }
    }

    /// Borrow the underlying destination.
    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Consume the writer and return the underlying destination.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Encode, write and flush one message.
    ///
    /// A message that cannot be encoded fails with a non-fatal error before
    /// any byte is written.
    pub async fn send(&mut self, message: Message) -> Result<()> {
        SinkExt::send(&mut self.inner, message).await
    }
}

impl<W: AsyncWrite> Sink<Message> for LineWriter<W> {
    type Error = FrameError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<()> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().inner.poll_close(cx)
    }
}
