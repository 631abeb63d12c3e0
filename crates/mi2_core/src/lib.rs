//! MI2 Core
//!
//! An async client for the GDB/MI2 machine interface. Provides the value grammar,
//! a typed message model, line-framed input/output channels over any tokio byte
//! stream, and a client that runs a cancellable read loop and publishes decoded
//! messages to subscribers.

pub mod client;
pub mod config;
pub mod error;
pub mod grammar;
pub mod message;
pub mod ops;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use client::{ClientEvent, ClientState, Mi2Client};
pub use config::Mi2Config;
pub use error::Mi2Error;
pub use grammar::{ParseError, Record, Value};
pub use message::{
    CommandMessage, ConsoleMessage, EventKind, EventMessage, InfoMessage, Message, MessageKind,
    ReplyMessage,
};
pub use stream::{Mi2InputStream, Mi2OutputStream};
pub use types::{Breakpoint, StopReason};

/// Result type alias using Mi2Error
pub type Result<T> = std::result::Result<T, Mi2Error>;
