use crate::{Mi2Client, Result};

/// Starts the inferior and stops at `main`.
pub async fn run(client: &Mi2Client) -> Result<()> {
    client.exec("-exec-run --start").await
}

pub async fn continue_execution(client: &Mi2Client, reverse: bool) -> Result<()> {
    let command = if reverse {
        "-exec-continue --reverse"
    } else {
        "-exec-continue"
    };
    client.exec(command).await
}

pub async fn interrupt(client: &Mi2Client) -> Result<()> {
    client.exec("-exec-interrupt").await
}
