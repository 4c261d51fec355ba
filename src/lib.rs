//! # tether - a tool-calling agent over MCP
//!
//! Bridges a language model (the Anthropic Messages API) to tools served by an
//! MCP server, and ships a small MCP server with two National Weather Service tools.
//!
//! ## Architecture
//!
//! 1. **Clients** talk to a model provider and turn transcripts into responses.
//! 2. **Tool services** list and execute tools; any connected MCP server is one.
//! 3. The **Agent** loops between the two until the model answers in plain text.
//! 4. The **Shell** wraps an agent in a line-oriented chat loop.
//!
//! ## Example
//! ```no_run
//! use tether::providers::{Anthropic, Provider};
//! use tether::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Anthropic::create("your-api-key".to_string());
//!     let server = tether::mcp::launch("target/release/weather-server").await?;
//!
//!     let agent = Agent::new(client, server);
//!     let answer = agent.process("Are there any weather alerts in Texas?").await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod client;
pub mod config;
pub mod http;
pub mod mcp;
pub mod model;
pub mod options;
pub mod providers;
pub mod shell;
pub mod tools;
pub mod weather;

pub use agent::{Agent, AgentError};
pub use client::{Client, ClientError};
pub use config::ClientConfig;
pub use model::{Message, Part, Response, Transcript};
pub use shell::Shell;
pub use tools::{ToolDescriptor, ToolError, ToolOutput, ToolService};

// Re-export rmcp for convenience
pub use rmcp;
