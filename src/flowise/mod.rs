// src/flowise/mod.rs

pub mod client;
pub mod config;
pub mod error;
pub mod stdio;
pub mod tool_protocol;
pub mod tools;

// Explicitly export the core types so callers reach them as
// flowise_mcp::FlowiseClient instead of flowise_mcp::flowise::client::FlowiseClient.
pub use client::FlowiseClient;
pub use config::Settings;
pub use error::FlowiseError;
pub use tools::FlowiseToolServer;
