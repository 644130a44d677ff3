//! Line-oriented terminal input and output

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Reads command lines and passwords and writes replies
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next input line without its line ending, or `None` at end of input
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub async fn write(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    pub async fn println(&mut self, text: &str) -> io::Result<()> {
        self.write(text).await?;
        self.write("\n").await
    }

    /// Prompts until a non-empty password is entered
    pub async fn read_password(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            self.write(prompt).await?;
            match self.read_line().await? {
                Some(password) if password.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    /// Prompts for a password twice until both entries match
    pub async fn confirm_password(&mut self) -> io::Result<Option<String>> {
        loop {
            let first = match self.read_password("input password: ").await? {
                Some(password) => password,
                None => return Ok(None),
            };
            let second = match self.read_password("confirm password: ").await? {
                Some(password) => password,
                None => return Ok(None),
            };

            if first == second {
                return Ok(Some(first));
            }
            self.println("passwords do not match, try again").await?;
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}
