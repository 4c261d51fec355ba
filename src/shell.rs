//! Interactive read-eval-print loop around an [`Agent`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::agent::Agent;
use crate::client::Client;
use crate::model::Transcript;
use crate::tools::ToolService;

/// Line-oriented chat loop.
///
/// Reads one query per line until `quit` (any case) or end of input. Failed
/// queries are reported as `Error: ...` and the loop keeps going.
pub struct Shell<'a, C: Client, T: ToolService> {
    agent: &'a Agent<C, T>,
    history: Option<Transcript>,
}

impl<'a, C: Client, T: ToolService> Shell<'a, C, T> {
    pub fn new(agent: &'a Agent<C, T>) -> Self {
        Self {
            agent,
            history: None,
        }
    }

    /// Carry one transcript across queries instead of starting fresh each time.
    pub fn remembering(mut self) -> Self {
        self.history = Some(Transcript::new());
        self
    }

    pub async fn run<R, W>(&mut self, mut input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        output
            .write_all(b"\nMCP Client Started!\nType your queries or 'quit' to exit.\n")
            .await?;

        let mut buf = Vec::new();
        loop {
            output.write_all(b"\nQuery: ").await?;
            output.flush().await?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let query = line.trim();
            if query.eq_ignore_ascii_case("quit") {
                break;
            }
            if query.is_empty() {
                continue;
            }

            let reply = match &mut self.history {
                Some(transcript) => self.agent.process_in(transcript, query).await,
                None => self.agent.process(query).await,
            };

            let text = match reply {
                Ok(answer) => format!("\n{}\n", answer),
                Err(e) => {
                    warn!(error = %e, "Query failed");
                    format!("\nError: {}\n", e)
                }
            };
            output.write_all(text.as_bytes()).await?;
        }

        output.flush().await
    }
}
