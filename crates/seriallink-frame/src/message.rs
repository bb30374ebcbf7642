use std::fmt;

use serde::Serialize;

/// The three kinds of message carried on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Expects a [`MessageKind::Response`] with the same identifier.
    Request,
    /// Answers the request with the same identifier.
    Response,
    /// Fire-and-forget; carries no meaningful identifier.
    Notification,
}

impl MessageKind {
    /// The first token of a line of this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Notification => "notify",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed link message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    /// Correlation identifier. Always 0 for notifications.
    pub id: u32,
    /// Free text, opaque to the link.
    pub command: String,
}

impl Message {
    /// Create a request with an explicit identifier.
    pub fn request(id: u32, command: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Request,
            id,
            command: command.into(),
        }
    }

    /// Create a response to the request with identifier `id`.
    pub fn response(id: u32, command: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Response,
            id,
            command: command.into(),
        }
    }

    /// Create a notification.
    pub fn notification(command: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Notification,
            id: 0,
            command: command.into(),
        }
    }

    pub fn is_request(&self) -> bool {
        self.kind == MessageKind::Request
    }

    pub fn is_response(&self) -> bool {
        self.kind == MessageKind::Response
    }

    /// Whether this is the response to request `id`.
    pub fn answers(&self, id: u32) -> bool {
        self.is_response() && self.id == id
    }
}

/// A bare command becomes a notification; the link retags it as needed.
impl From<&str> for Message {
    fn from(command: &str) -> Self {
        Message::notification(command)
    }
}

impl From<String> for Message {
    fn from(command: String) -> Self {
        Message::notification(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind_and_id() {
        assert_eq!(Message::request(7, "ping").kind, MessageKind::Request);
        assert_eq!(Message::response(7, "pong").id, 7);

        let note = Message::notification("boot");
        assert_eq!(note.kind, MessageKind::Notification);
        assert_eq!(note.id, 0);
    }

    #[test]
    fn answers_requires_response_with_same_id() {
        assert!(Message::response(3, "ok").answers(3));
        assert!(!Message::response(4, "ok").answers(3));
        assert!(!Message::request(3, "ok").answers(3));
    }

    #[test]
    fn commands_convert_into_notifications() {
        let message: Message = "status".into();
        assert_eq!(message, Message::notification("status"));
    }

    #[test]
    fn kind_displays_wire_keyword() {
        assert_eq!(MessageKind::Notification.keyword(), "notify");
        assert_eq!(MessageKind::Response.to_string(), "response");
    }
}
