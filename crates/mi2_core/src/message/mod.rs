//! Typed MI2 messages. One wire line is exactly one message.

mod command;
mod console;
mod event;
mod reply;

pub use command::CommandMessage;
pub use console::{ConsoleMessage, InfoMessage};
pub use event::{EventKind, EventMessage};
pub use reply::ReplyMessage;

use std::fmt;

use serde::Serialize;

use crate::grammar::{self, ParseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Command(CommandMessage),
    Console(ConsoleMessage),
    Info(InfoMessage),
    Event(EventMessage),
    Reply(ReplyMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Command,
    Console,
    Info,
    Event,
    Reply,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Command => "command",
            MessageKind::Console => "console",
            MessageKind::Info => "info",
            MessageKind::Event => "event",
            MessageKind::Reply => "reply",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Decodes one line (without its terminator).
    ///
    /// Returns `Ok(None)` when the leading character is not a known prefix; such
    /// lines are transport noise (inferior output, stray text) and are skipped by
    /// callers. Structural damage in a recognized line is an error.
    ///
    /// `^` result records come back as [`EventMessage`]s of kind
    /// [`EventKind::Result`]; use [`ReplyMessage::parse`] or
    /// [`EventMessage::as_reply`] when a reply is expected.
    pub fn parse_line(line: &str) -> Result<Option<Message>, ParseError> {
        let Some(prefix) = line.chars().next() else {
            return Ok(None);
        };

        let message = match prefix {
            '~' => Message::Console(ConsoleMessage::parse(line)?),
            '&' => Message::Info(InfoMessage::parse(line)?),
            '=' | '*' | '^' => Message::Event(EventMessage::parse(line)?),
            '-' => Message::Command(CommandMessage::parse(line)?),
            _ => return Ok(None),
        };

        Ok(Some(message))
    }

    /// Wire bytes for this message, including the trailing newline. `None` when the
    /// message has nothing that can be framed (an empty command).
    pub fn serialize(&self) -> Option<Vec<u8>> {
        match self {
            Message::Command(m) => m.serialize(),
            Message::Console(m) => m.serialize(),
            Message::Info(m) => m.serialize(),
            Message::Event(m) => m.serialize(),
            Message::Reply(m) => m.serialize(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Command(_) => MessageKind::Command,
            Message::Console(_) => MessageKind::Console,
            Message::Info(_) => MessageKind::Info,
            Message::Event(_) => MessageKind::Event,
            Message::Reply(_) => MessageKind::Reply,
        }
    }
}

impl From<CommandMessage> for Message {
    fn from(message: CommandMessage) -> Self {
        Message::Command(message)
    }
}

impl From<ConsoleMessage> for Message {
    fn from(message: ConsoleMessage) -> Self {
        Message::Console(message)
    }
}

impl From<InfoMessage> for Message {
    fn from(message: InfoMessage) -> Self {
        Message::Info(message)
    }
}

impl From<EventMessage> for Message {
    fn from(message: EventMessage) -> Self {
        Message::Event(message)
    }
}

impl From<ReplyMessage> for Message {
    fn from(message: ReplyMessage) -> Self {
        Message::Reply(message)
    }
}

/// Shared body parser for the `~"..."` and `&"..."` stream records.
fn parse_stream_record(line: &str, prefix: char) -> Result<String, ParseError> {
    let body = line.strip_prefix(prefix).ok_or(ParseError::Expected {
        expected: "a stream record prefix",
        found: line.chars().next(),
    })?;
    let (text, rest) = grammar::parse_quoted_string(body)?;
    if !rest.is_empty() {
        return Err(ParseError::TrailingInput(rest.to_string()));
    }
    Ok(text)
}

fn serialize_stream_record(prefix: char, text: &str) -> Vec<u8> {
    format!("{prefix}{}\n", grammar::quote(text)).into_bytes()
}
