//! Flowise tool catalog and dispatch.
//!
//! [`FlowiseToolServer`] implements [`ToolProtocol`] over the shared
//! [`FlowiseClient`]: it publishes metadata for all 50 Flowise operations and
//! routes each `(tool name, JSON arguments)` pair to the matching client
//! method. Argument extraction and defaulting happen here, so the client keeps
//! plain typed signatures.
//!
//! A failed client call is converted into a structured error payload inside a
//! [`ToolResult`] rather than propagated, so one failing tool call never takes
//! the server down. Only dispatch-level problems (unknown tool, malformed
//! arguments) surface as hard errors for the transport to report.

use crate::flowise::client::FlowiseClient;
use crate::flowise::error::FlowiseError;
use crate::flowise::tool_protocol::{
    ToolError, ToolMetadata, ToolParameter, ToolParameterType, ToolProtocol, ToolResult,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::error::Error;
use std::sync::Arc;

/// Dispatcher exposing the Flowise API as MCP tools.
pub struct FlowiseToolServer {
    client: Arc<FlowiseClient>,
}

impl FlowiseToolServer {
    pub fn new(client: Arc<FlowiseClient>) -> Self {
        Self { client }
    }

    /// Shared client session backing every tool call.
    pub fn client(&self) -> &Arc<FlowiseClient> {
        &self.client
    }

    /// Route one tool call to its client method.
    ///
    /// The outer `Result` carries dispatch errors (unknown tool, bad
    /// arguments); the inner one carries the client outcome.
    async fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<Result<Value, FlowiseError>, ToolError> {
        let c = &self.client;
        let outcome = match name {
            // --- system ---
            "ping" => c.ping().await,
            "list_nodes" => c.list_nodes().await.map(summarize_nodes),
            "get_node" => c.get_node(&req_str(args, "name")?).await,

            // --- chatflows ---
            "list_chatflows" => c.list_chatflows().await.map(summarize_chatflows),
            "get_chatflow" => c.get_chatflow(&req_str(args, "chatflow_id")?).await,
            "get_chatflow_by_apikey" => c.get_chatflow_by_apikey(&req_str(args, "apikey")?).await,
            "create_chatflow" => {
                c.create_chatflow(
                    &req_str(args, "name")?,
                    &str_or(args, "flow_data", "{}")?,
                    &str_or(args, "description", "")?,
                    &str_or(args, "chatflow_type", "CHATFLOW")?,
                )
                .await
            }
            "update_chatflow" => {
                c.update_chatflow(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "name")?.as_deref(),
                    opt_str(args, "flow_data")?.as_deref(),
                    opt_str(args, "description")?.as_deref(),
                    opt_bool(args, "deployed")?,
                    opt_bool(args, "is_public")?,
                    opt_str(args, "chatbot_config")?.as_deref(),
                    opt_str(args, "category")?.as_deref(),
                )
                .await
            }
            "delete_chatflow" => c.delete_chatflow(&req_str(args, "chatflow_id")?).await,

            // --- prediction ---
            "create_prediction" => {
                c.create_prediction(
                    &req_str(args, "chatflow_id")?,
                    &req_str(args, "question")?,
                    opt_str(args, "override_config")?.as_deref(),
                    opt_str(args, "history")?.as_deref(),
                    bool_or(args, "streaming", false)?,
                )
                .await
            }

            // --- assistants ---
            "list_assistants" => c.list_assistants().await,
            "get_assistant" => c.get_assistant(&req_str(args, "assistant_id")?).await,
            "create_assistant" => {
                c.create_assistant(
                    &req_str(args, "name")?,
                    &str_or(args, "description", "")?,
                    &str_or(args, "model", "gpt-4")?,
                    &str_or(args, "instructions", "")?,
                    opt_str(args, "credential")?.as_deref(),
                )
                .await
            }
            "update_assistant" => {
                c.update_assistant(
                    &req_str(args, "assistant_id")?,
                    opt_str(args, "details")?.as_deref(),
                    opt_str(args, "credential")?.as_deref(),
                )
                .await
            }
            "delete_assistant" => c.delete_assistant(&req_str(args, "assistant_id")?).await,

            // --- custom tools ---
            "list_tools" => c.list_tools().await,
            "get_tool" => c.get_tool(&req_str(args, "tool_id")?).await,
            "create_tool" => {
                c.create_tool(
                    &req_str(args, "name")?,
                    &req_str(args, "description")?,
                    opt_str(args, "schema")?.as_deref(),
                    opt_str(args, "func")?.as_deref(),
                    &str_or(args, "color", "#4CAF50")?,
                )
                .await
            }
            "update_tool" => {
                c.update_tool(
                    &req_str(args, "tool_id")?,
                    opt_str(args, "name")?.as_deref(),
                    opt_str(args, "description")?.as_deref(),
                    opt_str(args, "schema")?.as_deref(),
                    opt_str(args, "func")?.as_deref(),
                )
                .await
            }
            "delete_tool" => c.delete_tool(&req_str(args, "tool_id")?).await,

            // --- variables ---
            "list_variables" => c.list_variables().await,
            "create_variable" => {
                c.create_variable(
                    &req_str(args, "name")?,
                    &str_or(args, "value", "")?,
                    &str_or(args, "var_type", "string")?,
                )
                .await
            }
            "update_variable" => {
                c.update_variable(
                    &req_str(args, "var_id")?,
                    opt_str(args, "name")?.as_deref(),
                    opt_str(args, "value")?.as_deref(),
                    opt_str(args, "var_type")?.as_deref(),
                )
                .await
            }
            "delete_variable" => c.delete_variable(&req_str(args, "var_id")?).await,

            // --- document stores ---
            "list_document_stores" => c.list_document_stores().await,
            "get_document_store" => c.get_document_store(&req_str(args, "store_id")?).await,
            "create_document_store" => {
                c.create_document_store(&req_str(args, "name")?, &str_or(args, "description", "")?)
                    .await
            }
            "update_document_store" => {
                c.update_document_store(
                    &req_str(args, "store_id")?,
                    opt_str(args, "name")?.as_deref(),
                    opt_str(args, "description")?.as_deref(),
                )
                .await
            }
            "delete_document_store" => c.delete_document_store(&req_str(args, "store_id")?).await,

            // --- document chunks ---
            "get_document_chunks" => {
                c.get_document_chunks(
                    &req_str(args, "store_id")?,
                    &req_str(args, "loader_id")?,
                    int_or(args, "page_no", 1)?,
                )
                .await
            }
            "update_document_chunk" => {
                c.update_document_chunk(
                    &req_str(args, "store_id")?,
                    &req_str(args, "loader_id")?,
                    &req_str(args, "chunk_id")?,
                    opt_str(args, "page_content")?.as_deref(),
                    opt_str(args, "metadata")?.as_deref(),
                )
                .await
            }
            "delete_document_chunk" => {
                c.delete_document_chunk(
                    &req_str(args, "store_id")?,
                    &req_str(args, "loader_id")?,
                    &req_str(args, "chunk_id")?,
                )
                .await
            }

            // --- document operations ---
            "upsert_document" => {
                c.upsert_document(
                    &req_str(args, "store_id")?,
                    opt_str(args, "loader")?.as_deref(),
                    opt_str(args, "splitter")?.as_deref(),
                    opt_str(args, "embedding")?.as_deref(),
                    opt_str(args, "vector_store")?.as_deref(),
                    opt_str(args, "record_manager")?.as_deref(),
                    opt_str(args, "metadata")?.as_deref(),
                    bool_or(args, "replace_existing", false)?,
                    opt_str(args, "doc_id")?.as_deref(),
                )
                .await
            }
            "refresh_document_store" => {
                c.refresh_document_store(
                    &req_str(args, "store_id")?,
                    opt_str(args, "items")?.as_deref(),
                )
                .await
            }
            "query_document_store" => {
                c.query_document_store(&req_str(args, "store_id")?, &req_str(args, "query")?)
                    .await
            }
            "delete_document_loader" => {
                c.delete_document_loader(&req_str(args, "store_id")?, &req_str(args, "loader_id")?)
                    .await
            }
            "delete_vectorstore_data" => {
                c.delete_vectorstore_data(&req_str(args, "store_id")?).await
            }

            // --- chat messages ---
            "list_chat_messages" => {
                c.list_chat_messages(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "chat_type")?.as_deref(),
                    opt_str(args, "order")?.as_deref(),
                    opt_str(args, "chat_id")?.as_deref(),
                    opt_str(args, "session_id")?.as_deref(),
                    opt_str(args, "start_date")?.as_deref(),
                    opt_str(args, "end_date")?.as_deref(),
                )
                .await
            }
            "delete_chat_messages" => {
                c.delete_chat_messages(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "chat_id")?.as_deref(),
                    opt_str(args, "chat_type")?.as_deref(),
                    opt_str(args, "session_id")?.as_deref(),
                    bool_or(args, "hard_delete", false)?,
                )
                .await
            }

            // --- feedback ---
            "list_feedback" => {
                c.list_feedback(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "chat_id")?.as_deref(),
                    &str_or(args, "sort_order", "asc")?,
                )
                .await
            }
            "create_feedback" => {
                c.create_feedback(
                    &req_str(args, "chatflow_id")?,
                    &req_str(args, "chat_id")?,
                    &req_str(args, "message_id")?,
                    &req_str(args, "rating")?,
                    &str_or(args, "content", "")?,
                )
                .await
            }
            "update_feedback" => {
                c.update_feedback(
                    &req_str(args, "feedback_id")?,
                    opt_str(args, "rating")?.as_deref(),
                    opt_str(args, "content")?.as_deref(),
                )
                .await
            }

            // --- leads ---
            "list_leads" => c.list_leads(&req_str(args, "chatflow_id")?).await,
            "create_lead" => {
                c.create_lead(
                    &req_str(args, "chatflow_id")?,
                    &req_str(args, "chat_id")?,
                    opt_str(args, "name")?.as_deref(),
                    opt_str(args, "email")?.as_deref(),
                    opt_str(args, "phone")?.as_deref(),
                )
                .await
            }

            // --- vector upsert ---
            "upsert_vector" => {
                c.upsert_vector(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "stop_node_id")?.as_deref(),
                    opt_str(args, "override_config")?.as_deref(),
                )
                .await
            }

            // --- upsert history ---
            "list_upsert_history" => {
                c.list_upsert_history(
                    &req_str(args, "chatflow_id")?,
                    &str_or(args, "order", "ASC")?,
                    opt_str(args, "start_date")?.as_deref(),
                    opt_str(args, "end_date")?.as_deref(),
                )
                .await
            }
            "delete_upsert_history" => {
                c.delete_upsert_history(
                    &req_str(args, "chatflow_id")?,
                    opt_str(args, "ids")?.as_deref(),
                )
                .await
            }

            // --- credentials ---
            "list_credentials" => c.list_credentials().await,
            "create_credential" => {
                c.create_credential(
                    &req_str(args, "name")?,
                    &req_str(args, "credential_name")?,
                    &req_str(args, "encrypted_data")?,
                )
                .await
            }

            // --- marketplace ---
            "list_marketplace_templates" => c
                .list_marketplace_templates()
                .await
                .map(summarize_templates),

            other => return Err(ToolError::NotFound(other.to_string())),
        };
        Ok(outcome)
    }
}

#[async_trait]
impl ToolProtocol for FlowiseToolServer {
    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let args = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(Box::new(ToolError::InvalidArguments(
                    "arguments must be a JSON object".to_string(),
                )))
            }
        };
        match self.dispatch(tool_name, &args).await? {
            Ok(value) => Ok(ToolResult::success(value)),
            Err(err) => {
                log::warn!("tool '{}' failed: {}", tool_name, err);
                Ok(ToolResult::failure(err.to_value(), err.to_string()))
            }
        }
    }

    fn list_tools(&self) -> Vec<ToolMetadata> {
        catalog()
    }

    fn protocol_name(&self) -> &str {
        "flowise"
    }

    fn shutdown(&self) {
        self.client.close();
    }
}

// --- argument extraction ---

fn req_str(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
        None => Err(ToolError::InvalidArguments(format!(
            "missing required argument '{}'",
            key
        ))),
    }
}

fn opt_str(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a string, got {}",
            key, other
        ))),
    }
}

fn str_or(args: &Map<String, Value>, key: &str, default: &str) -> Result<String, ToolError> {
    Ok(opt_str(args, key)?.unwrap_or_else(|| default.to_string()))
}

fn opt_bool(args: &Map<String, Value>, key: &str) -> Result<Option<bool>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a boolean, got {}",
            key, other
        ))),
    }
}

fn bool_or(args: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ToolError> {
    Ok(opt_bool(args, key)?.unwrap_or(default))
}

fn int_or(args: &Map<String, Value>, key: &str, default: u32) -> Result<u32, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) if n.as_u64().is_some() => {
            Ok(n.as_u64().unwrap_or(default as u64) as u32)
        }
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "'{}' must be a non-negative integer, got {}",
            key, other
        ))),
    }
}

// --- list summarization ---
// Node, chatflow, and marketplace listings can be large; reduce them to the
// fields an agent actually navigates by. Non-array responses pass through.

fn summarize_nodes(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|n| {
                    json!({
                        "name": n.get("name"),
                        "category": n.get("category"),
                        "label": n.get("label"),
                    })
                })
                .collect(),
        ),
        other => other,
    }
}

fn summarize_chatflows(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|c| {
                    json!({
                        "id": c.get("id"),
                        "name": c.get("name"),
                        "type": c.get("type"),
                    })
                })
                .collect(),
        ),
        other => other,
    }
}

fn summarize_templates(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|t| {
                    let description = t
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .chars()
                        .take(120)
                        .collect::<String>();
                    json!({
                        "name": t.get("name"),
                        "type": t.get("type"),
                        "description": description,
                    })
                })
                .collect(),
        ),
        other => other,
    }
}

// --- catalog ---

fn req(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, ToolParameterType::String)
        .with_description(description)
        .required()
}

fn opt(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, ToolParameterType::String).with_description(description)
}

fn str_default(name: &str, description: &str, default: &str) -> ToolParameter {
    ToolParameter::new(name, ToolParameterType::String)
        .with_description(description)
        .with_default(json!(default))
}

fn flag(name: &str, description: &str, default: bool) -> ToolParameter {
    ToolParameter::new(name, ToolParameterType::Boolean)
        .with_description(description)
        .with_default(json!(default))
}

fn page(name: &str, description: &str, default: u32) -> ToolParameter {
    ToolParameter::new(name, ToolParameterType::Integer)
        .with_description(description)
        .with_default(json!(default))
}

fn tool(name: &str, description: &str) -> ToolMetadata {
    ToolMetadata::new(name, description)
}

/// Metadata for all 50 Flowise tools, in the order they are documented.
pub fn catalog() -> Vec<ToolMetadata> {
    vec![
        // system
        tool("ping", "Health-check the Flowise instance."),
        tool("list_nodes", "List all available node types in Flowise."),
        tool("get_node", "Get full schema for a specific Flowise node by name.")
            .with_parameter(req("name", "Node name")),
        // chatflows
        tool("list_chatflows", "List all chatflows."),
        tool("get_chatflow", "Get full details of a chatflow by ID.")
            .with_parameter(req("chatflow_id", "Chatflow ID")),
        tool("get_chatflow_by_apikey", "Look up a chatflow by its API key.")
            .with_parameter(req("apikey", "Chatflow API key")),
        tool("create_chatflow", "Create a new chatflow. flow_data is a JSON string.")
            .with_parameter(req("name", "Chatflow name"))
            .with_parameter(str_default("flow_data", "Flow graph as a JSON string", "{}"))
            .with_parameter(str_default("description", "Chatflow description", ""))
            .with_parameter(str_default("chatflow_type", "CHATFLOW or MULTIAGENT", "CHATFLOW")),
        tool("update_chatflow", "Update a chatflow. Only pass fields to change.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("name", "New name"))
            .with_parameter(opt("flow_data", "Flow graph as a JSON string"))
            .with_parameter(opt("description", "New description"))
            .with_parameter(ToolParameter::new("deployed", ToolParameterType::Boolean)
                .with_description("Deployment state"))
            .with_parameter(ToolParameter::new("is_public", ToolParameterType::Boolean)
                .with_description("Public visibility"))
            .with_parameter(opt("chatbot_config", "Chatbot config as a JSON string"))
            .with_parameter(opt("category", "Category label")),
        tool("delete_chatflow", "Delete a chatflow by ID.")
            .with_parameter(req("chatflow_id", "Chatflow ID")),
        // prediction
        tool("create_prediction", "Send a message to a chatflow and get an AI response.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(req("question", "Message to send"))
            .with_parameter(opt("override_config", "Config overrides as a JSON string"))
            .with_parameter(opt("history", "Prior messages as a JSON array string"))
            .with_parameter(flag("streaming", "Stream and aggregate the response", false)),
        // assistants
        tool("list_assistants", "List all assistants."),
        tool("get_assistant", "Get details of an assistant by ID.")
            .with_parameter(req("assistant_id", "Assistant ID")),
        tool("create_assistant", "Create a new OpenAI assistant in Flowise.")
            .with_parameter(req("name", "Assistant name"))
            .with_parameter(str_default("description", "Assistant description", ""))
            .with_parameter(str_default("model", "Model identifier", "gpt-4"))
            .with_parameter(str_default("instructions", "System instructions", ""))
            .with_parameter(opt("credential", "Credential ID")),
        tool("update_assistant", "Update an assistant. details is a JSON string.")
            .with_parameter(req("assistant_id", "Assistant ID"))
            .with_parameter(opt("details", "Assistant details as a JSON string"))
            .with_parameter(opt("credential", "Credential ID")),
        tool("delete_assistant", "Delete an assistant by ID.")
            .with_parameter(req("assistant_id", "Assistant ID")),
        // custom tools
        tool("list_tools", "List all custom tools in Flowise."),
        tool("get_tool", "Get a custom tool by ID.")
            .with_parameter(req("tool_id", "Tool ID")),
        tool("create_tool", "Create a new custom tool in Flowise. Color defaults to green (#4CAF50).")
            .with_parameter(req("name", "Tool name"))
            .with_parameter(req("description", "Tool description"))
            .with_parameter(opt("schema", "Input schema as a JSON string"))
            .with_parameter(opt("func", "JavaScript function body"))
            .with_parameter(str_default("color", "Display color", "#4CAF50")),
        tool("update_tool", "Update a custom tool by ID.")
            .with_parameter(req("tool_id", "Tool ID"))
            .with_parameter(opt("name", "New name"))
            .with_parameter(opt("description", "New description"))
            .with_parameter(opt("schema", "Input schema as a JSON string"))
            .with_parameter(opt("func", "JavaScript function body")),
        tool("delete_tool", "Delete a custom tool by ID.")
            .with_parameter(req("tool_id", "Tool ID")),
        // variables
        tool("list_variables", "List all Flowise variables."),
        tool("create_variable", "Create a new variable.")
            .with_parameter(req("name", "Variable name"))
            .with_parameter(str_default("value", "Variable value", ""))
            .with_parameter(str_default("var_type", "Variable type", "string")),
        tool("update_variable", "Update a variable by ID.")
            .with_parameter(req("var_id", "Variable ID"))
            .with_parameter(opt("name", "New name"))
            .with_parameter(opt("value", "New value"))
            .with_parameter(opt("var_type", "New type")),
        tool("delete_variable", "Delete a variable by ID.")
            .with_parameter(req("var_id", "Variable ID")),
        // document stores
        tool("list_document_stores", "List all document stores."),
        tool("get_document_store", "Get details of a document store by ID.")
            .with_parameter(req("store_id", "Document store ID")),
        tool("create_document_store", "Create a new document store.")
            .with_parameter(req("name", "Store name"))
            .with_parameter(str_default("description", "Store description", "")),
        tool("update_document_store", "Update a document store by ID.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(opt("name", "New name"))
            .with_parameter(opt("description", "New description")),
        tool("delete_document_store", "Delete a document store by ID.")
            .with_parameter(req("store_id", "Document store ID")),
        // document chunks
        tool("get_document_chunks", "Get chunks from a document loader within a store.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(req("loader_id", "Loader ID"))
            .with_parameter(page("page_no", "Page number", 1)),
        tool("update_document_chunk", "Update a specific chunk. metadata is a JSON string.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(req("loader_id", "Loader ID"))
            .with_parameter(req("chunk_id", "Chunk ID"))
            .with_parameter(opt("page_content", "Replacement chunk text"))
            .with_parameter(opt("metadata", "Chunk metadata as a JSON string")),
        tool("delete_document_chunk", "Delete a specific chunk.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(req("loader_id", "Loader ID"))
            .with_parameter(req("chunk_id", "Chunk ID")),
        // document operations
        tool("upsert_document", "Upsert a document into a store. Config params are JSON strings.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(opt("loader", "Loader config as a JSON string"))
            .with_parameter(opt("splitter", "Splitter config as a JSON string"))
            .with_parameter(opt("embedding", "Embedding config as a JSON string"))
            .with_parameter(opt("vector_store", "Vector store config as a JSON string"))
            .with_parameter(opt("record_manager", "Record manager config as a JSON string"))
            .with_parameter(opt("metadata", "Document metadata as a JSON string"))
            .with_parameter(flag("replace_existing", "Replace existing documents", false))
            .with_parameter(opt("doc_id", "Existing document ID to replace")),
        tool("refresh_document_store", "Re-process and upsert all documents in a store.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(opt("items", "Refresh items as a JSON array string")),
        tool("query_document_store", "Run a retrieval query against a document store vector index.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(req("query", "Query text")),
        tool("delete_document_loader", "Delete a document loader and its chunks from a store.")
            .with_parameter(req("store_id", "Document store ID"))
            .with_parameter(req("loader_id", "Loader ID")),
        tool("delete_vectorstore_data", "Delete vector store data from a document store.")
            .with_parameter(req("store_id", "Document store ID")),
        // chat messages
        tool("list_chat_messages", "List chat messages for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("chat_type", "INTERNAL or EXTERNAL"))
            .with_parameter(opt("order", "Sort order"))
            .with_parameter(opt("chat_id", "Chat ID filter"))
            .with_parameter(opt("session_id", "Session ID filter"))
            .with_parameter(opt("start_date", "Start date filter"))
            .with_parameter(opt("end_date", "End date filter")),
        tool("delete_chat_messages", "Delete chat messages for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("chat_id", "Chat ID filter"))
            .with_parameter(opt("chat_type", "INTERNAL or EXTERNAL"))
            .with_parameter(opt("session_id", "Session ID filter"))
            .with_parameter(flag("hard_delete", "Permanently delete", false)),
        // feedback
        tool("list_feedback", "List feedback for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("chat_id", "Chat ID filter"))
            .with_parameter(str_default("sort_order", "asc or desc", "asc")),
        tool("create_feedback", "Create feedback for a message. rating: THUMBS_UP or THUMBS_DOWN.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(req("chat_id", "Chat ID"))
            .with_parameter(req("message_id", "Message ID"))
            .with_parameter(req("rating", "THUMBS_UP or THUMBS_DOWN"))
            .with_parameter(str_default("content", "Feedback text", "")),
        tool("update_feedback", "Update existing feedback.")
            .with_parameter(req("feedback_id", "Feedback ID"))
            .with_parameter(opt("rating", "THUMBS_UP or THUMBS_DOWN"))
            .with_parameter(opt("content", "Feedback text")),
        // leads
        tool("list_leads", "List all leads for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID")),
        tool("create_lead", "Create a new lead for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(req("chat_id", "Chat ID"))
            .with_parameter(opt("name", "Lead name"))
            .with_parameter(opt("email", "Lead email"))
            .with_parameter(opt("phone", "Lead phone")),
        // vector upsert
        tool("upsert_vector", "Upsert vector embeddings for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("stop_node_id", "Node to stop at"))
            .with_parameter(opt("override_config", "Config overrides as a JSON string")),
        // upsert history
        tool("list_upsert_history", "Get upsert history for a chatflow.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(str_default("order", "ASC or DESC", "ASC"))
            .with_parameter(opt("start_date", "Start date filter"))
            .with_parameter(opt("end_date", "End date filter")),
        tool("delete_upsert_history", "Soft-delete upsert history records.")
            .with_parameter(req("chatflow_id", "Chatflow ID"))
            .with_parameter(opt("ids", "Record IDs as a JSON array string")),
        // credentials
        tool("list_credentials", "List all saved credentials (names and types, values encrypted)."),
        tool("create_credential", "Create a new credential.")
            .with_parameter(req("name", "Credential display name"))
            .with_parameter(req("credential_name", "Credential type name"))
            .with_parameter(req("encrypted_data", "Credential payload as a JSON string")),
        // marketplace
        tool("list_marketplace_templates", "List all marketplace templates available for import."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_all_fifty_operations() {
        let tools = catalog();
        assert_eq!(tools.len(), 50);
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 50, "tool names must be unique");
    }

    #[test]
    fn required_string_extraction() {
        let args = serde_json::from_str::<Map<String, Value>>(r#"{"name":"x","n":3}"#).unwrap();
        assert_eq!(req_str(&args, "name").unwrap(), "x");
        assert!(req_str(&args, "missing").is_err());
        assert!(req_str(&args, "n").is_err());
    }

    #[test]
    fn optional_extraction_treats_null_as_absent() {
        let args =
            serde_json::from_str::<Map<String, Value>>(r#"{"a":null,"b":"","c":true}"#).unwrap();
        assert_eq!(opt_str(&args, "a").unwrap(), None);
        assert_eq!(opt_str(&args, "b").unwrap(), Some(String::new()));
        assert_eq!(opt_str(&args, "missing").unwrap(), None);
        assert_eq!(opt_bool(&args, "c").unwrap(), Some(true));
        assert_eq!(bool_or(&args, "missing", true).unwrap(), true);
    }

    #[test]
    fn chatflow_summaries_keep_navigation_fields() {
        let listing = json!([
            {"id": "1", "name": "flow", "type": "CHATFLOW", "flowData": "{...huge...}"}
        ]);
        let summary = summarize_chatflows(listing);
        assert_eq!(summary, json!([{"id": "1", "name": "flow", "type": "CHATFLOW"}]));
    }

    #[test]
    fn template_summaries_truncate_description() {
        let long = "x".repeat(400);
        let listing = json!([{"name": "t", "type": "Chatflow", "description": long}]);
        let summary = summarize_templates(listing);
        assert_eq!(
            summary[0]["description"].as_str().map(str::len),
            Some(120)
        );
    }

    #[test]
    fn non_array_listing_passes_through() {
        let value = json!({"error": "unexpected"});
        assert_eq!(summarize_nodes(value.clone()), value);
    }
}
