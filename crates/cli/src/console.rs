//! Line-oriented terminal I/O.

use std::io;

use mercado_client::Confirm;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// A line reader paired with a writer.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// Console over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Next input line without its terminator; `None` at end of input.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub async fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    pub async fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text).await?;
        self.write("\n").await
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R, W> Confirm for Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Anything but `y`/`yes` (including end of input) is a no.
    async fn confirm(&mut self, prompt: &str) -> bool {
        if self.write(&format!("{prompt} [y/N] ")).await.is_err() {
            return false;
        }
        match self.read_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_confirm_accepts_only_yes() {
        for (input, expected) in [("y\n", true), ("YES\r\n", true), ("n\n", false), ("\n", false), ("", false)] {
            let mut console = Console::new(input.as_bytes(), Vec::new());
            assert_eq!(console.confirm("Delete?").await, expected, "input {input:?}");
            let output = String::from_utf8(console.into_output()).unwrap();
            assert_eq!(output, "Delete? [y/N] ");
        }
    }

    #[tokio::test]
    async fn test_read_line_strips_terminators() {
        let mut console = Console::new("list\r\nquit".as_bytes(), Vec::new());
        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("list"));
        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("quit"));
        assert_eq!(console.read_line().await.unwrap(), None);
    }
}
