use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::{message::Message, Mi2Config, Mi2Error, Result};

/// Reads newline-terminated MI2 records and decodes them into [`Message`]s.
///
/// Partial lines are kept in an internal buffer between calls, so dropping an
/// in-flight [`read_message`](Self::read_message) future (for example from a
/// `tokio::select!` branch) loses nothing; the next call resumes the same line.
pub struct Mi2InputStream<R> {
    reader: R,
    buffer: Vec<u8>,
    prompt: String,
    max_line_length: usize,
}

impl<R> Mi2InputStream<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &Mi2Config::default())
    }

    pub fn with_config(reader: R, config: &Mi2Config) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            prompt: config.prompt.clone(),
            max_line_length: config.max_line_length,
        }
    }

    /// Reads the next message, skipping prompt lines and lines with no known prefix.
    ///
    /// `Ok(None)` means the peer closed the stream cleanly at a line boundary.
    pub async fn read_message(&mut self) -> Result<Option<Message>> {
        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };

            if self.is_prompt(&line) {
                continue;
            }

            match Message::parse_line(&line) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {
                    tracing::debug!("Skipping non-MI line: {:?}", line);
                }
                Err(e) => {
                    return Err(Mi2Error::InvalidData(format!(
                        "failed to parse {line:?}: {e}"
                    )));
                }
            }
        }
    }

    /// Reads one line without its terminator (`\n` or `\r\n`).
    ///
    /// Returns `Ok(None)` on end of input with nothing buffered and
    /// [`Mi2Error::Closed`] when the stream ends in the middle of a line.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        loop {
            if self.buffer.len() > self.max_line_length {
                self.buffer.clear();
                return Err(Mi2Error::InvalidData(format!(
                    "line exceeds {} bytes",
                    self.max_line_length
                )));
            }

            // One byte past the limit, so an overlong line is detected without
            // reading the rest of it.
            let limit = (self.max_line_length as u64)
                .saturating_add(1)
                .saturating_sub(self.buffer.len() as u64);
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;

            if self.buffer.last() == Some(&b'\n') {
                break;
            }

            if read == 0 && self.buffer.len() <= self.max_line_length {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let pending = self.buffer.len();
                self.buffer.clear();
                return Err(Mi2Error::Closed(format!(
                    "stream ended with {pending} bytes of an unterminated line"
                )));
            }
        }

        let mut line = std::mem::take(&mut self.buffer);
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        String::from_utf8(line)
            .map(Some)
            .map_err(|e| Mi2Error::InvalidData(format!("line is not valid UTF-8: {e}")))
    }

    fn is_prompt(&self, line: &str) -> bool {
        line.trim_end() == self.prompt
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
