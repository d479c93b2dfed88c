//! # flowise-mcp
//!
//! An MCP (Model Context Protocol) server exposing the full Flowise REST API
//! as 50 callable tools, so an AI agent can manage chatflows, assistants,
//! documents, credentials, and predictions through uniform tool calls instead
//! of raw HTTP.
//!
//! The crate is layered bottom-up:
//!
//! * **[`Settings`]** — connection configuration resolved once from the
//!   environment, with defaults for everything (a bare start targets
//!   `http://localhost:3000`, unauthenticated).
//! * **[`FlowiseClient`]** — the one shared HTTP session for the process. One
//!   async method per Flowise endpoint; owns request construction, bearer-auth
//!   injection, JSON decoding, and the [`FlowiseError`] taxonomy. No retries,
//!   no caching: each call is exactly one request.
//! * **[`FlowiseToolServer`]** — the tool catalog and dispatcher, implementing
//!   [`tool_protocol::ToolProtocol`]. Converts platform failures into
//!   structured error text so a failing call never crashes the server.
//! * **[`stdio`]** — newline-delimited JSON-RPC 2.0 transport on
//!   stdin/stdout; concurrent `tools/call` requests each run on their own
//!   task.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flowise_mcp::{FlowiseClient, FlowiseToolServer, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env();
//!     let client = Arc::new(FlowiseClient::new(&settings)?);
//!     let server = Arc::new(FlowiseToolServer::new(Arc::clone(&client)));
//!     flowise_mcp::stdio::serve(server).await?;
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod flowise;

pub use flowise::client::FlowiseClient;
pub use flowise::config::Settings;
pub use flowise::error::FlowiseError;
pub use flowise::stdio;
pub use flowise::tool_protocol;
pub use flowise::tools;
pub use flowise::tools::FlowiseToolServer;
