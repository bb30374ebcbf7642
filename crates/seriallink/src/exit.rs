use std::fmt;
use std::io;

use seriallink_frame::FrameError;
use seriallink_link::LinkError;
use seriallink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotFound => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidEndpoint { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Open { ref source, .. } | TransportError::Connect { ref source, .. } => {
            let code = match source.kind() {
                io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
                io::ErrorKind::TimedOut => TIMEOUT,
                _ => TRANSPORT_ERROR,
            };
            CliError::new(code, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        other if other.is_fatal() => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
        LinkError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        LinkError::NotARequest(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        LinkError::Shutdown | LinkError::ListenerClosed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = link_error("request failed", LinkError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.code, TIMEOUT);
        assert_eq!(err.message, "request failed: request timed out after 5s");
    }

    #[test]
    fn bad_endpoint_is_a_usage_error() {
        let err = transport_error(
            "connect failed",
            TransportError::InvalidEndpoint {
                endpoint: "tcp://nope".into(),
                reason: "expected tcp://host:port",
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let err = transport_error(
            "connect failed",
            TransportError::Connect {
                endpoint: "tcp://127.0.0.1:1".into(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn frame_errors_split_by_severity() {
        assert_eq!(frame_error("x", FrameError::LineTooLong { max: 8 }).code, TRANSPORT_ERROR);
        assert_eq!(frame_error("x", FrameError::EmbeddedLineBreak).code, DATA_INVALID);
    }

    #[test]
    fn queue_full_is_internal() {
        let err = link_error("x", LinkError::QueueFull { capacity: 32 });
        assert_eq!(err.code, INTERNAL);
    }
}
