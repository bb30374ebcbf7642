use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::device::SerialDevice;
use crate::error::{Result, TransportError};
use crate::traits::LinkTransport;

const TCP_SCHEME: &str = "tcp://";
const UNIX_SCHEME: &str = "unix://";
const STDIO: &str = "-";

/// Read half of a [`Connection`].
pub type BoxedRead = Box<dyn AsyncRead + Unpin + Send>;
/// Write half of a [`Connection`].
pub type BoxedWrite = Box<dyn AsyncWrite + Unpin + Send>;

/// Where a link should attach.
///
/// Textual forms:
/// - `tcp://host:port`: TCP socket
/// - `unix:///path/to.sock`: Unix domain socket
/// - `-`: this process's stdin (read) and stdout (write)
/// - anything else: a serial device or file path opened read-write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
    Stdio,
    Device(PathBuf),
}

impl Endpoint {
    /// Open or connect the endpoint.
    pub async fn connect(&self) -> Result<Connection> {
        let (read, write): (BoxedRead, BoxedWrite) = match self {
            Endpoint::Tcp(addr) => {
                let stream =
                    TcpStream::connect(addr.as_str())
                        .await
                        .map_err(|source| TransportError::Connect {
                            endpoint: self.to_string(),
                            source,
                        })?;
                // Line protocol: small writes should leave immediately.
                stream.set_nodelay(true)?;
                let (read, write) = LinkTransport::into_split(stream);
                (Box::new(read), Box::new(write))
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(|source| {
                    TransportError::Connect {
                        endpoint: self.to_string(),
                        source,
                    }
                })?;
                let (read, write) = LinkTransport::into_split(stream);
                (Box::new(read), Box::new(write))
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => {
                return Err(TransportError::InvalidEndpoint {
                    endpoint: self.to_string(),
                    reason: "unix sockets are not supported on this platform",
                })
            }
            Endpoint::Stdio => (Box::new(tokio::io::stdin()), Box::new(tokio::io::stdout())),
            Endpoint::Device(path) => {
                let (read, write) = SerialDevice::open(path).await?.into_split();
                (Box::new(read), Box::new(write))
            }
        };

        debug!(endpoint = %self, "transport ready");
        Ok(Connection {
            endpoint: self.clone(),
            read,
            write,
        })
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| TransportError::InvalidEndpoint {
            endpoint: input.to_string(),
            reason,
        };

        if let Some(addr) = input.strip_prefix(TCP_SCHEME) {
            return match addr.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                    Ok(Endpoint::Tcp(addr.to_string()))
                }
                _ => Err(invalid("expected tcp://host:port")),
            };
        }
        if let Some(path) = input.strip_prefix(UNIX_SCHEME) {
            if path.is_empty() {
                return Err(invalid("expected unix:///path/to/socket"));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }
        if input == STDIO {
            return Ok(Endpoint::Stdio);
        }
        if input.trim().is_empty() {
            return Err(invalid("endpoint must not be empty"));
        }
        Ok(Endpoint::Device(PathBuf::from(input)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{TCP_SCHEME}{addr}"),
            Endpoint::Unix(path) => write!(f, "{UNIX_SCHEME}{}", path.display()),
            Endpoint::Stdio => f.write_str(STDIO),
            Endpoint::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An opened endpoint, ready to be served by a link.
pub struct Connection {
    endpoint: Endpoint,
    read: BoxedRead,
    write: BoxedWrite,
}

impl Connection {
    /// The endpoint this connection was opened from.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl LinkTransport for Connection {
    type Read = BoxedRead;
    type Write = BoxedWrite;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
