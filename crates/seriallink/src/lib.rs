//! Request/response multiplexing over serial devices and other byte streams.
//!
//! seriallink carries three kinds of newline-delimited text messages over any
//! duplex byte stream: requests, responses correlated to them by a numeric
//! identifier, and fire-and-forget notifications. Any number of listeners can
//! subscribe to incoming traffic.
//!
//! # Crate Structure
//!
//! - [`transport`]: duplex byte streams (serial devices, TCP, Unix sockets, in-memory)
//! - [`frame`]: the line format, codec, and message reader/writer
//! - [`link`]: the multiplexer itself (behind the default `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use seriallink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use seriallink_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use seriallink_link::*;
}

pub use seriallink_frame::{Message, MessageKind};
#[cfg(feature = "link")]
pub use seriallink_link::{Link, LinkConfig, LinkError};
