use crate::{types::Breakpoint, Mi2Client, Mi2Error, Result};

/// Sends `-break-insert` for `breakpoint`. gdb answers with `^done,bkpt={...}`,
/// which the client reports as [`crate::ClientEvent::BreakpointInserted`].
pub async fn insert_breakpoint(client: &Mi2Client, breakpoint: &Breakpoint) -> Result<()> {
    client.exec(&breakpoint.to_command()).await
}

pub async fn remove_breakpoint(client: &Mi2Client, breakpoint_id: u32) -> Result<()> {
    if breakpoint_id == 0 {
        return Err(Mi2Error::invalid_data("breakpoint ids start at 1"));
    }
    client.exec(&format!("-break-delete {breakpoint_id}")).await
}
