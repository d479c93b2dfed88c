//! Tool protocol abstraction.
//!
//! The MCP transport talks to the Flowise dispatch layer through the
//! [`ToolProtocol`] trait: a named catalog of tools plus an `execute` entry
//! point taking JSON arguments. Keeping the seam here means the stdio server
//! never knows about Flowise, and tests can drive the transport with a mock.
//!
//! # Example
//!
//! ```rust
//! use flowise_mcp::tool_protocol::{ToolParameter, ToolParameterType};
//!
//! let param = ToolParameter::new("chatflow_id", ToolParameterType::String)
//!     .with_description("Chatflow identifier")
//!     .required();
//! assert!(param.required);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt;

/// Outcome of one tool execution: a decoded value on success, or a structured
/// error payload the agent can inspect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call completed without error.
    pub success: bool,
    /// On success, the platform response; on failure, a structured error
    /// object. Either way this is what gets serialized back to the agent.
    pub output: Value,
    /// Human-readable message when `success` is false.
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(output: Value, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output,
            error: Some(message.into()),
        }
    }
}

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ToolParameterType {
    fn json_name(self) -> &'static str {
        match self {
            ToolParameterType::String => "string",
            ToolParameterType::Number => "number",
            ToolParameterType::Integer => "integer",
            ToolParameterType::Boolean => "boolean",
            ToolParameterType::Array => "array",
            ToolParameterType::Object => "object",
        }
    }
}

/// One parameter in a tool's signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
    pub default: Option<Value>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
            default: None,
        }
    }

    /// Human readable description surfaced in the generated schema.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Default applied by the dispatch layer when the agent omits the
    /// parameter.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Name, description, and signature of one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    /// Render the signature as a JSON Schema object, the shape MCP clients
    /// expect under `inputSchema` in a `tools/list` response.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.json_name()));
            if let Some(description) = &param.description {
                prop.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Errors raised by the dispatch layer itself, before or instead of a client
/// call.
#[derive(Debug, Clone)]
pub enum ToolError {
    /// Requested tool name is not in the catalog.
    NotFound(String),
    /// The supplied arguments failed validation or deserialization.
    InvalidArguments(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound(name) => write!(f, "tool not found: {}", name),
            ToolError::InvalidArguments(msg) => write!(f, "invalid arguments: {}", msg),
        }
    }
}

impl Error for ToolError {}

/// Trait implemented by tool dispatchers.
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    /// Execute a named tool with JSON arguments.
    async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    /// Metadata for every tool in the catalog.
    fn list_tools(&self) -> Vec<ToolMetadata>;

    /// Protocol identifier used in logs and server info.
    fn protocol_name(&self) -> &str;

    /// Release any held resources. Called once at shutdown.
    fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_builder_sets_fields() {
        let param = ToolParameter::new("question", ToolParameterType::String)
            .with_description("The message to send")
            .required()
            .with_default(json!("hi"));
        assert_eq!(param.name, "question");
        assert!(param.required);
        assert_eq!(param.default, Some(json!("hi")));
    }

    #[test]
    fn input_schema_lists_required_parameters() {
        let metadata = ToolMetadata::new("get_chatflow", "Get a chatflow by ID")
            .with_parameter(
                ToolParameter::new("chatflow_id", ToolParameterType::String).required(),
            )
            .with_parameter(
                ToolParameter::new("verbose", ToolParameterType::Boolean)
                    .with_default(json!(false)),
            );
        let schema = metadata.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["chatflow_id"]["type"], "string");
        assert_eq!(schema["properties"]["verbose"]["default"], json!(false));
        assert_eq!(schema["required"], json!(["chatflow_id"]));
    }
}
