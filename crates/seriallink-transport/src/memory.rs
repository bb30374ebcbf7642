//! In-memory transport for tests and demos.

use tokio::io::{duplex, DuplexStream};

use crate::traits::LinkTransport;

/// Default buffer size for each direction of a [`MemoryTransport`] pair.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// One end of an in-memory duplex connection.
///
/// Bytes written on one end's write half arrive on the other end's read half.
/// Dropping a write half signals end-of-stream to the opposite reader.
#[derive(Debug)]
pub struct MemoryTransport {
    read: DuplexStream,
    write: DuplexStream,
}

impl MemoryTransport {
    /// Create a connected pair of transports.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a connected pair with a custom per-direction buffer size.
    ///
    /// Small buffers are handy for exercising partial reads and writes.
    pub fn pair_with_buffer_size(buffer_size: usize) -> (Self, Self) {
        let (a_to_b_write, a_to_b_read) = duplex(buffer_size);
        let (b_to_a_write, b_to_a_read) = duplex(buffer_size);

        let a = MemoryTransport {
            read: b_to_a_read,
            write: a_to_b_write,
        };
        let b = MemoryTransport {
            read: a_to_b_read,
            write: b_to_a_write,
        };

        (a, b)
    }
}

impl LinkTransport for MemoryTransport {
    type Read = DuplexStream;
    type Write = DuplexStream;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}
