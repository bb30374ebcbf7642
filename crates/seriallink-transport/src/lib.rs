//! Duplex byte-stream transports for seriallink.
//!
//! A link runs on top of anything that can be split into an independent read
//! half and write half:
//! - Serial devices (or any character device / file opened read-write)
//! - TCP and Unix domain sockets
//! - Arbitrary `AsyncRead` / `AsyncWrite` pairs (stdin/stdout, pipes)
//! - In-memory pairs for tests
//!
//! This is the lowest layer of seriallink. Everything else builds on the
//! [`LinkTransport`] trait provided here.

pub mod device;
pub mod endpoint;
pub mod error;
pub mod memory;
pub mod traits;

pub use device::SerialDevice;
pub use endpoint::{Connection, Endpoint};
pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::{LinkTransport, Split};
