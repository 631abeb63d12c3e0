//! Convenience commands built on [`crate::Mi2Client::exec`]. All of them are
//! fire-and-forget: gdb's answer arrives as a client event.

pub mod breakpoints;
pub mod exec;
