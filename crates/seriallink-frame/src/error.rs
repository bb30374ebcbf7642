use crate::message::MessageKind;

/// Errors that can occur while encoding, decoding, reading or writing lines.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing lines.
    #[error("line I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An incoming line grew past the configured maximum without a terminator.
    #[error("line exceeds maximum length of {max} bytes")]
    LineTooLong { max: usize },

    /// The line was empty.
    #[error("empty line")]
    EmptyLine,

    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// The first token is not a known message kind.
    #[error("unexpected message type: {0:?}")]
    UnknownKind(String),

    /// A request or response line ended before its identifier.
    #[error("missing {0} identifier")]
    MissingIdentifier(MessageKind),

    /// The identifier token is not an unsigned 32-bit integer.
    #[error("unable to parse {kind} identifier: {token:?}")]
    InvalidIdentifier { kind: MessageKind, token: String },

    /// The line ended before the command text.
    #[error("missing {0} command")]
    MissingCommand(MessageKind),

    /// The command contains a line break and cannot be sent as one line.
    #[error("command contains a line break")]
    EmbeddedLineBreak,

    /// The encoded line would exceed the configured maximum.
    #[error("encoded message is {len} bytes, max {max}")]
    MessageTooLong { len: usize, max: usize },
}

impl FrameError {
    /// Whether the error ends the stream it occurred on.
    ///
    /// Everything else concerns a single line or message: it is reported and
    /// processing continues with the next one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::LineTooLong { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
