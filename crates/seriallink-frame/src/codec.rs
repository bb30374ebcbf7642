use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{FrameError, Result};
use crate::message::{Message, MessageKind};

/// Line terminator appended to every outgoing line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Default maximum line length: 64 KiB, excluding the terminator.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Encode a message into its wire line, without the terminator.
///
/// ```text
/// request <id> <command>
/// response <id> <command>
/// notify <command>
/// ```
pub fn encode_line(message: &Message) -> Result<String> {
    if message.command.contains(['\n', '\r']) {
        return Err(FrameError::EmbeddedLineBreak);
    }

    let keyword = message.kind.keyword();
    Ok(match message.kind {
        MessageKind::Request | MessageKind::Response => {
            format!("{keyword} {} {}", message.id, message.command)
        }
        MessageKind::Notification => format!("{keyword} {}", message.command),
    })
}

/// Decode one line (without terminator) into a message.
///
/// Tokens are separated by single spaces; the command is the remainder of the
/// line after the kind and, for requests and responses, the identifier.
pub fn decode_line(line: &str) -> Result<Message> {
    if line.is_empty() {
        return Err(FrameError::EmptyLine);
    }

    let (keyword, rest) = split_token(line);
    let kind = match keyword {
        "request" => MessageKind::Request,
        "response" => MessageKind::Response,
        "notify" => MessageKind::Notification,
        other => return Err(FrameError::UnknownKind(other.to_string())),
    };

    if kind == MessageKind::Notification {
        let command = rest.ok_or(FrameError::MissingCommand(kind))?;
        return Ok(Message::notification(command));
    }

    let rest = rest.ok_or(FrameError::MissingIdentifier(kind))?;
    let (token, command) = split_token(rest);
    let id = parse_identifier(kind, token)?;
    let command = command.ok_or(FrameError::MissingCommand(kind))?;

    Ok(Message {
        kind,
        id,
        command: command.to_string(),
    })
}

fn split_token(input: &str) -> (&str, Option<&str>) {
    match input.split_once(' ') {
        Some((token, rest)) => (token, Some(rest)),
        None => (input, None),
    }
}

fn parse_identifier(kind: MessageKind, token: &str) -> Result<u32> {
    if token.is_empty() {
        return Err(FrameError::MissingIdentifier(kind));
    }
    // `u32::from_str` would also accept a leading '+'.
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::InvalidIdentifier {
            kind,
            token: token.to_string(),
        });
    }
    token.parse().map_err(|_| FrameError::InvalidIdentifier {
        kind,
        token: token.to_string(),
    })
}

/// Configuration for the line codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum line length in bytes, excluding the terminator. Default: 64 KiB.
    pub max_line_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// tokio-util codec splitting a byte stream into lines and encoding messages.
///
/// Decoding yields raw lines (terminator and an optional trailing `\r`
/// removed) so that a malformed line never poisons the framed stream; parsing
/// happens one level up in [`LineReader`](crate::LineReader).
#[derive(Debug, Clone)]
pub struct LineCodec {
    max_line_length: usize,
    /// Bytes of the buffer already scanned for a terminator.
    next_index: usize,
}

impl LineCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a codec from explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            next_index: 0,
        }
    }

    /// Maximum accepted line length.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn take_line(src: &mut BytesMut, len: usize, consumed: usize) -> Bytes {
    let mut line = src.split_to(consumed);
    line.truncate(len);
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        let read_to = src.len().min(self.max_line_length.saturating_add(1));
        let terminator = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == LINE_TERMINATOR);

        match terminator {
            Some(offset) => {
                let len = self.next_index + offset;
                self.next_index = 0;
                Ok(Some(take_line(src, len, len + 1)))
            }
            None if src.len() > self.max_line_length => Err(FrameError::LineTooLong {
                max: self.max_line_length,
            }),
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Final line without a terminator.
        self.next_index = 0;
        let len = src.len();
        Ok(Some(take_line(src, len, len)))
    }
}

impl Encoder<Message> for LineCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let line = encode_line(&item)?;
        if line.len() > self.max_line_length {
            return Err(FrameError::MessageTooLong {
                len: line.len(),
                max: self.max_line_length,
            });
        }

        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(LINE_TERMINATOR);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_each_kind() {
        assert_eq!(
            encode_line(&Message::request(1, "ping")).unwrap(),
            "request 1 ping"
        );
        assert_eq!(
            encode_line(&Message::response(42, "pong")).unwrap(),
            "response 42 pong"
        );
        assert_eq!(
            encode_line(&Message::notification("led on")).unwrap(),
            "notify led on"
        );
    }

    #[test]
    fn notification_ignores_identifier_on_the_wire() {
        let mut message = Message::notification("tick");
        message.id = 99;
        assert_eq!(encode_line(&message).unwrap(), "notify tick");
    }

    #[test]
    fn encode_rejects_line_breaks() {
        let err = encode_line(&Message::notification("two\nlines")).unwrap_err();
        assert!(matches!(err, FrameError::EmbeddedLineBreak));
        assert!(encode_line(&Message::request(1, "cr\r")).is_err());
    }

    #[test]
    fn decodes_each_kind() {
        assert_eq!(
            decode_line("request 1 ping").unwrap(),
            Message::request(1, "ping")
        );
        assert_eq!(
            decode_line("response 4294967295 pong").unwrap(),
            Message::response(u32::MAX, "pong")
        );
        assert_eq!(
            decode_line("notify temperature 21.5").unwrap(),
            Message::notification("temperature 21.5")
        );
    }

    #[test]
    fn command_is_remainder_of_line() {
        let message = decode_line("request 9 set speed  fast ").unwrap();
        assert_eq!(message.command, "set speed  fast ");
    }

    #[test]
    fn empty_command_is_allowed_after_separator() {
        assert_eq!(decode_line("request 3 ").unwrap(), Message::request(3, ""));
        assert_eq!(decode_line("notify ").unwrap(), Message::notification(""));
    }

    #[test]
    fn roundtrip_preserves_messages() {
        let messages = [
            Message::request(1, "ping"),
            Message::response(0, "a b c"),
            Message::notification(""),
            Message::request(u32::MAX, "wrap"),
        ];
        for message in messages {
            let line = encode_line(&message).unwrap();
            assert_eq!(decode_line(&line).unwrap(), message);
        }
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for line in [
            "request abc ping",
            "response -1 pong",
            "request +1 ping",
            "request 4294967296 ping",
        ] {
            assert!(
                matches!(decode_line(line), Err(FrameError::InvalidIdentifier { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn rejects_missing_tokens() {
        assert!(matches!(
            decode_line("request"),
            Err(FrameError::MissingIdentifier(MessageKind::Request))
        ));
        assert!(matches!(
            decode_line("response "),
            Err(FrameError::MissingIdentifier(MessageKind::Response))
        ));
        assert!(matches!(
            decode_line("request 5"),
            Err(FrameError::MissingCommand(MessageKind::Request))
        ));
        assert!(matches!(
            decode_line("notify"),
            Err(FrameError::MissingCommand(MessageKind::Notification))
        ));
    }

    #[test]
    fn rejects_unknown_kind_and_empty_line() {
        assert!(matches!(
            decode_line("hello world"),
            Err(FrameError::UnknownKind(kind)) if kind == "hello"
        ));
        assert!(matches!(decode_line(""), Err(FrameError::EmptyLine)));
    }

    #[test]
    fn codec_splits_lines_and_strips_carriage_return() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("notify a\r\nnotify b\n");

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "notify a");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "notify b");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn codec_waits_for_terminator_across_partial_reads() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        for chunk in ["req", "uest 1", " pi", "ng"] {
            buf.extend_from_slice(chunk.as_bytes());
            assert!(codec.decode(&mut buf).unwrap().is_none());
        }
        buf.extend_from_slice(b"\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "request 1 ping");
    }

    #[test]
    fn codec_yields_empty_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("\n\r\n");
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_empty());
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_empty());
    }

    #[test]
    fn codec_returns_unterminated_final_line_at_eof() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("notify last");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(codec.decode_eof(&mut buf).unwrap().unwrap(), "notify last");
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn codec_rejects_overlong_line() {
        let mut codec = LineCodec::with_config(&FrameConfig { max_line_length: 8 });

        let mut exact = BytesMut::from("12345678\n");
        assert_eq!(codec.decode(&mut exact).unwrap().unwrap(), "12345678");

        let mut long = BytesMut::from("123456789");
        assert!(matches!(
            codec.decode(&mut long),
            Err(FrameError::LineTooLong { max: 8 })
        ));
    }

    #[test]
    fn encoder_appends_terminator() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Message::response(1, "pong"), &mut buf).unwrap();
        codec.encode(Message::notification("done"), &mut buf).unwrap();
        assert_eq!(&buf[..], b"response 1 pong\nnotify done\n");
    }

    #[test]
    fn encoder_rejects_oversized_message_without_touching_buffer() {
        let mut codec = LineCodec::with_config(&FrameConfig { max_line_length: 10 });
        let mut buf = BytesMut::new();

        let err = codec
            .encode(Message::notification("far too long"), &mut buf)
            .unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLong { max: 10, .. }));
        assert!(buf.is_empty());
    }
}
