use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadHalf, WriteHalf};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A duplex byte stream that can be split into separate read and write halves.
///
/// The link's reader task owns the read half and its writer task owns the
/// write half, so the two directions never contend for the same handle.
pub trait LinkTransport: Send + 'static {
    /// The read half type.
    type Read: AsyncRead + Unpin + Send + 'static;
    /// The write half type.
    type Write: AsyncWrite + Unpin + Send + 'static;

    /// Split the transport into its read and write halves.
    fn into_split(self) -> (Self::Read, Self::Write);
}

impl LinkTransport for TcpStream {
    type Read = OwnedReadHalf;
    type Write = OwnedWriteHalf;

    fn into_split(self) -> (Self::Read, Self::Write) {
        TcpStream::into_split(self)
    }
}

#[cfg(unix)]
impl LinkTransport for tokio::net::UnixStream {
    type Read = tokio::net::unix::OwnedReadHalf;
    type Write = tokio::net::unix::OwnedWriteHalf;

    fn into_split(self) -> (Self::Read, Self::Write) {
        tokio::net::UnixStream::into_split(self)
    }
}

impl LinkTransport for DuplexStream {
    type Read = ReadHalf<DuplexStream>;
    type Write = WriteHalf<DuplexStream>;

    fn into_split(self) -> (Self::Read, Self::Write) {
        tokio::io::split(self)
    }
}

/// A transport assembled from an already separate read half and write half.
///
/// Useful for stdin/stdout, pipes to a child process, or a pair of device
/// handles.
#[derive(Debug)]
pub struct Split<R, W> {
    read: R,
    write: W,
}

impl<R, W> Split<R, W> {
    /// Pair a read half with a write half.
    pub fn new(read: R, write: W) -> Self {
        Self { read, write }
    }
}

impl<R, W> LinkTransport for Split<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Read = R;
    type Write = W;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
