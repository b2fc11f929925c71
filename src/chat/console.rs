//! Console surface: line input and received-payload display
//!
//! Chat traffic goes straight to stdout (it is the product surface, not a
//! diagnostic); logs go through `tracing` like everything else.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Prompt shown before each outgoing line
const PROMPT: &str = "Message:\n";

/// Line-at-a-time reader over stdin.
///
/// `None` means end-of-input: the user closed the stream, which the send
/// loop treats the same as cancellation.
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the outgoing-message prompt
pub async fn prompt() -> std::io::Result<()> {
    let mut out = tokio::io::stdout();
    out.write_all(PROMPT.as_bytes()).await?;
    out.flush().await
}

/// Display a received chunk: its length and the raw bytes, then restore the
/// prompt for the interleaved send loop.
pub async fn show_received(payload: &[u8]) -> std::io::Result<()> {
    let text = format!(
        "\nReceived ({}): {}\n{}",
        payload.len(),
        String::from_utf8_lossy(payload),
        PROMPT
    );
    let mut out = tokio::io::stdout();
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}
