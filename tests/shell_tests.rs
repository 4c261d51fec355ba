use async_trait::async_trait;
use rmcp::model::Tool;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tether::client::{Client, ClientError};
use tether::model::{Message, Response};
use tether::options::{ModelOptions, TransportOptions};
use tether::tools::{ToolDescriptor, ToolError, ToolOutput, ToolService};
use tether::{Agent, Shell};
use tokio::io::BufReader;

/// Echoes the last user text back, or fails when asked to.
#[derive(Clone, Default)]
struct EchoClient {
    seen: Arc<Mutex<Vec<usize>>>,
    options: ModelOptions<()>,
    transport: TransportOptions,
}

#[async_trait]
impl Client for EchoClient {
    type ModelProvider = ();

    async fn request(
        &self,
        messages: Vec<Message>,
        _tools: Vec<ToolDescriptor>,
    ) -> Result<Response, ClientError> {
        self.seen.lock().unwrap().push(messages.len());
        let last = messages
            .last()
            .and_then(|m| m.content())
            .unwrap_or_default();
        if last == "explode" {
            return Err(ClientError::ProviderError("model unavailable".to_string()));
        }
        Ok(Response::text(format!("echo: {}", last)))
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport
    }
}

struct NoTools;

#[async_trait]
impl ToolService for NoTools {
    async fn list_tools(&self) -> Result<Vec<Tool>, ToolError> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, name: String, _args: Value) -> Result<ToolOutput, ToolError> {
        Err(ToolError::Mcp(format!("unknown tool {}", name)))
    }
}

async fn run_shell(
    agent: &Agent<EchoClient, NoTools>,
    input: impl AsRef<[u8]>,
    remember: bool,
) -> String {
    let mut shell = Shell::new(agent);
    if remember {
        shell = shell.remembering();
    }
    let mut output = Vec::new();
    shell
        .run(BufReader::new(input.as_ref()), &mut output)
        .await
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[tokio::test]
async fn test_prints_answers_until_quit() {
    let agent = Agent::new(EchoClient::default(), NoTools);

    let output = run_shell(&agent, "hello\n  QUIT  \nnever sent\n", false).await;

    assert!(output.starts_with("\nMCP Client Started!\nType your queries or 'quit' to exit.\n"));
    assert!(output.contains("\nQuery: \necho: hello\n"));
    assert!(!output.contains("never sent"));
}

#[tokio::test]
async fn test_errors_do_not_stop_the_loop() {
    let agent = Agent::new(EchoClient::default(), NoTools);

    let output = run_shell(&agent, "explode\nstill alive\n", false).await;

    assert!(output.contains("\nError: Provider error: model unavailable\n"));
    assert!(output.contains("echo: still alive"));
}

#[tokio::test]
async fn test_blank_lines_are_skipped_and_eof_ends() {
    let client = EchoClient::default();
    let agent = Agent::new(client.clone(), NoTools);

    run_shell(&agent, "\n   \nonly\n", false).await;

    assert_eq!(client.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fresh_transcript_per_query_by_default() {
    let client = EchoClient::default();
    let agent = Agent::new(client.clone(), NoTools);

    run_shell(&agent, "one\ntwo\nquit\n", false).await;

    assert_eq!(*client.seen.lock().unwrap(), vec![1, 1]);
}

#[tokio::test]
async fn test_remembering_carries_the_transcript() {
    let client = EchoClient::default();
    let agent = Agent::new(client.clone(), NoTools);

    run_shell(&agent, "one\ntwo\nquit\n", true).await;

    assert_eq!(*client.seen.lock().unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn test_invalid_utf8_line_does_not_end_the_loop() {
    let client = EchoClient::default();
    let agent = Agent::new(client.clone(), NoTools);

    let output = run_shell(&agent, b"caf\xe9\nhello\n", false).await;

    assert!(output.contains("echo: caf\u{FFFD}"));
    assert!(output.contains("echo: hello"));
    assert_eq!(client.seen.lock().unwrap().len(), 2);
}
