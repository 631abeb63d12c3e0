use thiserror::Error;

use crate::grammar::ParseError;

#[derive(Error, Debug)]
pub enum Mi2Error {
    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Stream closed: {0}")]
    Closed(String),

    #[error("The operation was cancelled")]
    Cancelled,

    #[error("Already listening: {0}")]
    AlreadyListening(String),

    #[error("gdb error: {message}")]
    Reply { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Mi2Error {
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::NotConnected(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn reply(message: impl Into<String>) -> Self {
        Self::Reply {
            message: message.into(),
        }
    }

    /// True for errors produced by cancelling an in-flight operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<ParseError> for Mi2Error {
    fn from(err: ParseError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_error_construction() {
        let err = Mi2Error::reply("No symbol table is loaded.");
        match err {
            Mi2Error::Reply { message } => assert_eq!(message, "No symbol table is loaded."),
            _ => panic!("Expected Reply variant"),
        }
    }

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            Mi2Error::not_connected("not connected to gdb").to_string(),
            "Not connected: not connected to gdb"
        );
        assert_eq!(
            Mi2Error::invalid_data("bad line").to_string(),
            "Invalid data: bad line"
        );
        assert_eq!(
            Mi2Error::Cancelled.to_string(),
            "The operation was cancelled"
        );
        assert_eq!(Mi2Error::reply("oops").to_string(), "gdb error: oops");
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: Mi2Error = ParseError::UnterminatedString.into();
        match err {
            Mi2Error::InvalidData(message) => assert!(message.contains("unterminated")),
            _ => panic!("Expected InvalidData variant"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let mi2_err: Mi2Error = io_err.into();
        match mi2_err {
            Mi2Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Mi2Error::Cancelled.is_cancelled());
        assert!(!Mi2Error::invalid_data("x").is_cancelled());
    }
}
