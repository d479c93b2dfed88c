//! MCP stdio transport.
//!
//! Speaks newline-delimited JSON-RPC 2.0 on stdin/stdout, the Model Context
//! Protocol's stdio framing. The transport knows nothing about Flowise; it
//! drives whatever [`ToolProtocol`] it is handed.
//!
//! Handled methods: `initialize`, `ping`, `tools/list`, and `tools/call`.
//! Notifications (messages without an `id`) are consumed silently. Each
//! `tools/call` is spawned onto its own task, so slow platform calls never
//! block the read loop and responses may complete out of order — the JSON-RPC
//! `id` keeps them matched to their requests.

use crate::flowise::tool_protocol::ToolProtocol;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// MCP protocol revision this server implements.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the stdio server until stdin reaches EOF, then shut the protocol down.
pub async fn serve(protocol: Arc<dyn ToolProtocol>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // All responses funnel through one writer task; concurrent tool calls
    // must never interleave bytes on stdout.
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(message) = rx.recv().await {
            let mut line = message.to_string();
            line.push('\n');
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("discarding unparseable message: {}", e);
                let _ = tx.send(error_response(
                    Value::Null,
                    -32700,
                    &format!("parse error: {}", e),
                ));
                continue;
            }
        };

        let method = message
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let id = message.get("id").cloned();

        match (method.as_str(), id) {
            // Notifications expect no response.
            (method, None) => log::debug!("notification: {}", method),
            ("tools/call", Some(id)) => {
                let protocol = Arc::clone(&protocol);
                let tx = tx.clone();
                let params = message.get("params").cloned().unwrap_or(Value::Null);
                tokio::spawn(async move {
                    let response = call_tool(&protocol, id, params).await;
                    let _ = tx.send(response);
                });
            }
            (method, Some(id)) => {
                let _ = tx.send(handle_request(&protocol, method, id));
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    protocol.shutdown();
    Ok(())
}

/// Answer the non-tool-call request methods inline.
fn handle_request(protocol: &Arc<dyn ToolProtocol>, method: &str, id: Value) -> Value {
    match method {
        "initialize" => result_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => result_response(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = protocol
                .list_tools()
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "inputSchema": t.input_schema(),
                    })
                })
                .collect();
            result_response(id, json!({ "tools": tools }))
        }
        other => error_response(id, -32601, &format!("method not found: {}", other)),
    }
}

/// Execute one tool call and wrap the outcome in an MCP tool response.
///
/// Tool failures (including remote platform errors) are reported as `isError`
/// content, not JSON-RPC errors, so the calling agent can read the structured
/// error text and the session keeps running.
async fn call_tool(protocol: &Arc<dyn ToolProtocol>, id: Value, params: Value) -> Value {
    let name = match params.get("name").and_then(Value::as_str) {
        Some(name) => name.to_string(),
        None => return error_response(id, -32602, "missing tool name"),
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match protocol.execute(&name, arguments).await {
        Ok(result) => result_response(
            id,
            json!({
                "content": [{ "type": "text", "text": result.output.to_string() }],
                "isError": !result.success,
            }),
        ),
        Err(err) => result_response(
            id,
            json!({
                "content": [{
                    "type": "text",
                    "text": json!({ "error": { "kind": "dispatch", "message": err.to_string() } }).to_string(),
                }],
                "isError": true,
            }),
        ),
    }
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowise::tool_protocol::{ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolResult};
    use async_trait::async_trait;
    use std::error::Error;

    struct MockProtocol;

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _arguments: Value,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            match tool_name {
                "echo" => Ok(ToolResult::success(json!({"tool": "echo"}))),
                other => Err(Box::new(ToolError::NotFound(other.to_string()))),
            }
        }

        fn list_tools(&self) -> Vec<ToolMetadata> {
            vec![ToolMetadata::new("echo", "Echo back").with_parameter(
                ToolParameter::new("message", ToolParameterType::String).required(),
            )]
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    fn protocol() -> Arc<dyn ToolProtocol> {
        Arc::new(MockProtocol)
    }

    #[test]
    fn initialize_reports_tools_capability() {
        let response = handle_request(&protocol(), "initialize", json!(1));
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_carries_input_schema() {
        let response = handle_request(&protocol(), "tools/list", json!(2));
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[test]
    fn unknown_method_is_a_jsonrpc_error() {
        let response = handle_request(&protocol(), "resources/list", json!(3));
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn tool_call_success_is_text_content() {
        let response = call_tool(
            &protocol(),
            json!(4),
            json!({"name": "echo", "arguments": {"message": "hi"}}),
        )
        .await;
        assert_eq!(response["result"]["isError"], false);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("echo"));
    }

    #[tokio::test]
    async fn unknown_tool_reports_is_error_content() {
        let response = call_tool(&protocol(), json!(5), json!({"name": "bogus"})).await;
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("bogus"));
    }

    #[tokio::test]
    async fn missing_tool_name_is_invalid_params() {
        let response = call_tool(&protocol(), json!(6), json!({})).await;
        assert_eq!(response["error"]["code"], -32602);
    }
}
