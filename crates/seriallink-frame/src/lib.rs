//! Newline-delimited message framing for seriallink.
//!
//! Every message travels as one human-readable text line:
//!
//! ```text
//! request <id> <command>
//! response <id> <command>
//! notify <command>
//! ```
//!
//! `<id>` is an unsigned 32-bit correlation identifier and `<command>` is the
//! rest of the line. No escaping is defined, so a command can contain spaces
//! but never a line break.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{decode_line, encode_line, FrameConfig, LineCodec, DEFAULT_MAX_LINE_LENGTH};
pub use error::{FrameError, Result};
pub use message::{Message, MessageKind};
pub use reader::LineReader;
pub use writer::LineWriter;
