use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_core::Stream;
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::{decode_line, FrameConfig, LineCodec};
use crate::error::{FrameError, Result};
use crate::message::Message;

pin_project! {
    /// A stream of messages decoded from any `AsyncRead` source.
    ///
    /// Handles partial reads internally and skips empty lines. A malformed
    /// line is yielded as a non-fatal `Err` (see [`FrameError::is_fatal`]) and
    /// the stream keeps going; I/O failures and over-long lines are fatal and
    /// end the stream.
    pub struct LineReader<R> {
        #[pin]
        inner: FramedRead<R, LineCodec>,
    }
}

impl<R: AsyncRead> LineReader<R> {
    /// Create a new line reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, &FrameConfig::default())
    }

    /// Create a new line reader with explicit configuration.
    pub fn with_config(inner: R, config: &FrameConfig) -> Self {
        Self {
            inner: FramedRead::new(inner, LineCodec::with_config(config)),
        }
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: AsyncRead> Stream for LineReader<R> {
    type Item = Result<Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let line = match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(line)) => line,
                Some(Err(err)) => return Poll::Ready(Some(Err(err))),
                None => return Poll::Ready(None),
            };

            if line.is_empty() {
                tracing::trace!("skipping empty line");
                continue;
            }

            let decoded = std::str::from_utf8(&line)
                .map_err(|_| FrameError::InvalidUtf8)
                .and_then(decode_line);
            return Poll::Ready(Some(decoded));
        }
    }
}
