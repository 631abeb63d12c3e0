use serde::Serialize;

use crate::grammar::ParseError;

/// An outbound MI command such as `-break-insert main`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandMessage {
    command: String,
}

impl CommandMessage {
    /// `command` may be given with or without its leading `-`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = command.into();
    }

    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let body = line.strip_prefix('-').ok_or(ParseError::Expected {
            expected: "'-'",
            found: line.chars().next(),
        })?;
        Ok(Self::new(body.trim()))
    }

    /// `None` for an empty command, or one containing a line break, since neither
    /// can be framed as a single line.
    pub fn serialize(&self) -> Option<Vec<u8>> {
        if self.command.is_empty() || self.command.contains(['\n', '\r']) {
            return None;
        }

        let mut bytes = Vec::with_capacity(self.command.len() + 2);
        if !self.command.starts_with('-') {
            bytes.push(b'-');
        }
        bytes.extend_from_slice(self.command.as_bytes());
        bytes.push(b'\n');
        Some(bytes)
    }
}
