use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{message::Message, Mi2Error, Result};

/// Serializes [`Message`]s onto a writable stream, one line per message.
pub struct Mi2OutputStream<W> {
    writer: W,
}

impl<W> Mi2OutputStream<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Fails with [`Mi2Error::InvalidData`] before touching the stream when the
    /// message has no wire form.
    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        let bytes = message.serialize().ok_or_else(|| {
            Mi2Error::invalid_data(format!("{} message has no wire form", message.kind()))
        })?;

        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
