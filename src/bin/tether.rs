//! Interactive client: launches an MCP server and chats with a model that can call its tools.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tether::{mcp, Agent, ClientConfig, Shell, ToolService};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tether", version, about = "Chat with a model that can call MCP tools")]
struct Cli {
    /// MCP server to launch: a .py or .js script, or an executable.
    server: Option<PathBuf>,

    /// Keep one conversation across queries instead of starting fresh each time.
    #[arg(long)]
    remember: bool,

    /// Maximum model calls per query (overrides TETHER_MAX_ROUNDS).
    #[arg(long)]
    max_rounds: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(server) = cli.server.clone() else {
        println!("Usage: tether <path_to_server_script>");
        return ExitCode::from(1);
    };

    match run(server, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("\nFATAL CLIENT STARTUP ERROR: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(server: PathBuf, cli: &Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("loading client configuration")?;
    let max_rounds = cli.max_rounds.unwrap_or(config.max_rounds);

    println!("Attempting to connect to server...");
    let connection = mcp::launch(&server)
        .await
        .with_context(|| format!("connecting to {}", server.display()))?;

    let tools = connection.list_tools().await.context("listing tools")?;
    let names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
    println!("\nConnected to server with tools: {:?}", names);

    let agent = Agent::new(config.client(), &connection).with_max_rounds(max_rounds);
    let mut shell = Shell::new(&agent);
    if cli.remember {
        shell = shell.remembering();
    }

    let outcome = shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;

    println!("Cleaning up resources...");
    drop(shell);
    drop(agent);
    connection.cancel().await?;

    outcome.context("chat loop I/O")
}
