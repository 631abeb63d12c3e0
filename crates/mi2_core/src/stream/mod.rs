//! Line framing over tokio byte streams.

mod input;
mod output;

pub use input::Mi2InputStream;
pub use output::Mi2OutputStream;
