use serde::Serialize;

use super::{parse_stream_record, serialize_stream_record};
use crate::grammar::ParseError;

/// Console stream output (`~"..."`): text gdb would print on its CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleMessage {
    message: String,
}

impl ConsoleMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    pub fn parse(line: &str) -> Result<Self, ParseError> {
        parse_stream_record(line, '~').map(Self::new)
    }

    pub fn serialize(&self) -> Option<Vec<u8>> {
        Some(serialize_stream_record('~', &self.message))
    }
}

/// Log stream output (`&"..."`): gdb's internal diagnostics and command echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoMessage {
    message: String,
}

impl InfoMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parse(line: &str) -> Result<Self, ParseError> {
        parse_stream_record(line, '&').map(Self::new)
    }

    pub fn serialize(&self) -> Option<Vec<u8>> {
        Some(serialize_stream_record('&', &self.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_round_trip() {
        let text = "say \"hi\"\\\n\tbye";
        let bytes = ConsoleMessage::new(text).serialize().unwrap();
        assert_eq!(bytes, b"~\"say \\\"hi\\\"\\\\\\n\\tbye\"\n".to_vec());

        let line = std::str::from_utf8(&bytes).unwrap().trim_end_matches('\n');
        assert_eq!(ConsoleMessage::parse(line).unwrap().message(), text);
    }

    #[test]
    fn info_uses_ampersand_prefix() {
        let bytes = InfoMessage::new("file main\n").serialize().unwrap();
        assert_eq!(bytes, b"&\"file main\\n\"\n".to_vec());
        assert!(InfoMessage::parse("~\"console\"").is_err());
    }

    #[test]
    fn parse_requires_quoted_payload() {
        assert!(ConsoleMessage::parse("~hello").is_err());
        assert_eq!(
            ConsoleMessage::parse("~\"this is a test message\"")
                .unwrap()
                .message(),
            "this is a test message"
        );
    }
}
