mod breakpoint;
mod stop_reason;

pub use breakpoint::Breakpoint;
pub use stop_reason::StopReason;
