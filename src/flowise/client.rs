//! HTTP client for the Flowise REST API.
//!
//! [`FlowiseClient`] owns one pooled `reqwest::Client` for the whole process
//! and exposes one async method per Flowise endpoint. Every method follows the
//! same shape: substitute required identifiers into the path (percent-encoded
//! exactly once), attach optional parameters as query pairs or body fields,
//! send exactly one request with the configured bearer token, and decode the
//! response as an opaque [`serde_json::Value`].
//!
//! The client never interprets platform responses beyond JSON-decodability and
//! never retries. Structured parameters that arrive as pre-serialized JSON
//! text are parsed at this boundary; a parse failure surfaces as
//! [`FlowiseError::InvalidParameter`] before any network I/O happens.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowise_mcp::{FlowiseClient, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env();
//!     let client = FlowiseClient::new(&settings)?;
//!     let health = client.ping().await?;
//!     println!("{}", health);
//!     client.close();
//!     Ok(())
//! }
//! ```

use crate::flowise::config::Settings;
use crate::flowise::error::FlowiseError;
use futures_util::StreamExt;
use reqwest::{Client, Method, Response};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared client session for one Flowise instance.
///
/// Exactly one instance exists per process (wrapped in an `Arc` by the tool
/// layer); concurrent tool calls issue requests through the same connection
/// pool without re-authenticating per call.
pub struct FlowiseClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    closed: AtomicBool,
}

impl FlowiseClient {
    /// Build a client from resolved settings.
    ///
    /// The underlying pool keeps idle connections alive for 90 seconds, holds
    /// up to 10 idle connections per host, and sends TCP keepalives every 60
    /// seconds. The overall per-request timeout comes from
    /// [`Settings::request_timeout`].
    pub fn new(settings: &Settings) -> Result<Self, FlowiseError> {
        let http = Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| FlowiseError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(FlowiseClient {
            http,
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Mark the session closed. Idempotent; the pooled connections are
    /// released when the client is dropped. Calling any request method after
    /// `close()` is undefined behavior for callers, but `close()` itself never
    /// panics on the shutdown path.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::info!("Flowise client closed ({})", self.base_url);
        }
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // --- request plumbing ---

    fn prepare(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Issue exactly one request and decode the response.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Vec<(&'static str, String)>,
        body: Option<Value>,
    ) -> Result<Value, FlowiseError> {
        log::debug!("flowise request: {} {}", method, path);
        let mut req = self.prepare(method, path, &query);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(FlowiseError::from_reqwest)?;
        Self::decode(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, FlowiseError> {
        self.request(Method::GET, path, Vec::new(), None).await
    }

    async fn decode(response: Response) -> Result<Value, FlowiseError> {
        let status = response.status();
        let body = response.text().await.map_err(FlowiseError::from_reqwest)?;
        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            // Responses are forwarded unchanged; a non-JSON success body is
            // relayed as a plain string value.
            Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
        } else {
            log::warn!("flowise responded {}: {}", status, body);
            Err(FlowiseError::Remote {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// POST a prediction request whose response is a server-sent event stream,
    /// and reconstitute the frames into one aggregate JSON value.
    async fn request_streaming(&self, path: &str, body: Value) -> Result<Value, FlowiseError> {
        log::debug!("flowise streaming request: POST {}", path);
        let response = self
            .prepare(Method::POST, path, &[])
            .json(&body)
            .send()
            .await
            .map_err(FlowiseError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(FlowiseError::from_reqwest)?;
            return Err(FlowiseError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut raw = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FlowiseError::from_reqwest)?;
            raw.push_str(&String::from_utf8_lossy(&chunk));
        }
        Ok(aggregate_event_stream(&raw))
    }

    // --- system ---

    /// Health-check the instance. GET `/api/v1/ping`.
    pub async fn ping(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/ping").await
    }

    /// List all available node types.
    pub async fn list_nodes(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/nodes").await
    }

    /// Fetch the full schema for one node type.
    pub async fn get_node(&self, name: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/nodes/{}", seg(name))).await
    }

    // --- chatflows ---

    pub async fn list_chatflows(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/chatflows").await
    }

    pub async fn get_chatflow(&self, chatflow_id: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/chatflows/{}", seg(chatflow_id)))
            .await
    }

    pub async fn get_chatflow_by_apikey(&self, apikey: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/chatflows/apikey/{}", seg(apikey)))
            .await
    }

    /// Create a chatflow. `flow_data` is pre-serialized JSON text; it is
    /// validated here and relayed in canonical form, since Flowise stores the
    /// graph as a string column.
    pub async fn create_chatflow(
        &self,
        name: &str,
        flow_data: &str,
        description: &str,
        chatflow_type: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({
            "name": name,
            "flowData": validate_json_text("flow_data", flow_data)?,
            "description": description,
            "type": chatflow_type,
        });
        self.request(Method::POST, "/api/v1/chatflows", Vec::new(), Some(body))
            .await
    }

    /// Update a chatflow; only provided fields land in the request body.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_chatflow(
        &self,
        chatflow_id: &str,
        name: Option<&str>,
        flow_data: Option<&str>,
        description: Option<&str>,
        deployed: Option<bool>,
        is_public: Option<bool>,
        chatbot_config: Option<&str>,
        category: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "name", name);
        put_value(
            &mut body,
            "flowData",
            validate_json_text_opt("flow_data", flow_data)?.map(Value::String),
        );
        put_str(&mut body, "description", description);
        put_bool(&mut body, "deployed", deployed);
        put_bool(&mut body, "isPublic", is_public);
        put_value(
            &mut body,
            "chatbotConfig",
            validate_json_text_opt("chatbot_config", chatbot_config)?.map(Value::String),
        );
        put_str(&mut body, "category", category);
        self.request(
            Method::PUT,
            &format!("/api/v1/chatflows/{}", seg(chatflow_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_chatflow(&self, chatflow_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/chatflows/{}", seg(chatflow_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- prediction ---

    /// Send a message to a chatflow. With `streaming` the chunked response is
    /// consumed in full and folded into a single JSON value, so the caller
    /// always receives one final answer.
    pub async fn create_prediction(
        &self,
        chatflow_id: &str,
        question: &str,
        override_config: Option<&str>,
        history: Option<&str>,
        streaming: bool,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        body.insert("question".to_string(), json!(question));
        put_value(
            &mut body,
            "overrideConfig",
            parse_json_opt("override_config", override_config)?,
        );
        put_value(&mut body, "history", parse_json_opt("history", history)?);
        let path = format!("/api/v1/prediction/{}", seg(chatflow_id));
        if streaming {
            body.insert("streaming".to_string(), json!(true));
            self.request_streaming(&path, Value::Object(body)).await
        } else {
            self.request(Method::POST, &path, Vec::new(), Some(Value::Object(body)))
                .await
        }
    }

    // --- assistants ---

    pub async fn list_assistants(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/assistants").await
    }

    pub async fn get_assistant(&self, assistant_id: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/assistants/{}", seg(assistant_id)))
            .await
    }

    /// Create an OpenAI assistant. The details object is serialized into the
    /// string field Flowise expects.
    pub async fn create_assistant(
        &self,
        name: &str,
        description: &str,
        model: &str,
        instructions: &str,
        credential: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let details = json!({
            "name": name,
            "description": description,
            "model": model,
            "instructions": instructions,
        });
        let mut body = Map::new();
        body.insert("details".to_string(), json!(details.to_string()));
        put_str(&mut body, "credential", credential);
        self.request(
            Method::POST,
            "/api/v1/assistants",
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    /// Update an assistant. `details` is pre-serialized JSON text.
    pub async fn update_assistant(
        &self,
        assistant_id: &str,
        details: Option<&str>,
        credential: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_value(
            &mut body,
            "details",
            validate_json_text_opt("details", details)?.map(Value::String),
        );
        put_str(&mut body, "credential", credential);
        self.request(
            Method::PUT,
            &format!("/api/v1/assistants/{}", seg(assistant_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/assistants/{}", seg(assistant_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- custom tools ---

    pub async fn list_tools(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/tools").await
    }

    pub async fn get_tool(&self, tool_id: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/tools/{}", seg(tool_id))).await
    }

    /// Create a custom tool. `schema` is pre-serialized JSON text describing
    /// the tool's input schema; `func` is JavaScript source relayed verbatim.
    pub async fn create_tool(
        &self,
        name: &str,
        description: &str,
        schema: Option<&str>,
        func: Option<&str>,
        color: &str,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        body.insert("name".to_string(), json!(name));
        body.insert("description".to_string(), json!(description));
        put_value(
            &mut body,
            "schema",
            validate_json_text_opt("schema", schema)?.map(Value::String),
        );
        put_str(&mut body, "func", func);
        body.insert("color".to_string(), json!(color));
        self.request(
            Method::POST,
            "/api/v1/tools",
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn update_tool(
        &self,
        tool_id: &str,
        name: Option<&str>,
        description: Option<&str>,
        schema: Option<&str>,
        func: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "name", name);
        put_str(&mut body, "description", description);
        put_value(
            &mut body,
            "schema",
            validate_json_text_opt("schema", schema)?.map(Value::String),
        );
        put_str(&mut body, "func", func);
        self.request(
            Method::PUT,
            &format!("/api/v1/tools/{}", seg(tool_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_tool(&self, tool_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/tools/{}", seg(tool_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- variables ---

    pub async fn list_variables(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/variables").await
    }

    /// Create a variable. Defaults (empty value, `"string"` type) are sent
    /// explicitly rather than omitted.
    pub async fn create_variable(
        &self,
        name: &str,
        value: &str,
        var_type: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({ "name": name, "value": value, "type": var_type });
        self.request(Method::POST, "/api/v1/variables", Vec::new(), Some(body))
            .await
    }

    pub async fn update_variable(
        &self,
        var_id: &str,
        name: Option<&str>,
        value: Option<&str>,
        var_type: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "name", name);
        put_str(&mut body, "value", value);
        put_str(&mut body, "type", var_type);
        self.request(
            Method::PUT,
            &format!("/api/v1/variables/{}", seg(var_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_variable(&self, var_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/variables/{}", seg(var_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- document stores ---

    pub async fn list_document_stores(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/document-store/store").await
    }

    pub async fn get_document_store(&self, store_id: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/document-store/store/{}", seg(store_id)))
            .await
    }

    pub async fn create_document_store(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({ "name": name, "description": description });
        self.request(
            Method::POST,
            "/api/v1/document-store/store",
            Vec::new(),
            Some(body),
        )
        .await
    }

    pub async fn update_document_store(
        &self,
        store_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "name", name);
        put_str(&mut body, "description", description);
        self.request(
            Method::PUT,
            &format!("/api/v1/document-store/store/{}", seg(store_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_document_store(&self, store_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/document-store/store/{}", seg(store_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- document chunks ---

    /// Fetch one page of chunks from a loader within a store.
    pub async fn get_document_chunks(
        &self,
        store_id: &str,
        loader_id: &str,
        page_no: u32,
    ) -> Result<Value, FlowiseError> {
        self.get(&format!(
            "/api/v1/document-store/chunks/{}/{}/{}",
            seg(store_id),
            seg(loader_id),
            page_no
        ))
        .await
    }

    /// Update one chunk. `metadata` is pre-serialized JSON text.
    pub async fn update_document_chunk(
        &self,
        store_id: &str,
        loader_id: &str,
        chunk_id: &str,
        page_content: Option<&str>,
        metadata: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "pageContent", page_content);
        put_value(&mut body, "metadata", parse_json_opt("metadata", metadata)?);
        self.request(
            Method::PUT,
            &format!(
                "/api/v1/document-store/chunks/{}/{}/{}",
                seg(store_id),
                seg(loader_id),
                seg(chunk_id)
            ),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    pub async fn delete_document_chunk(
        &self,
        store_id: &str,
        loader_id: &str,
        chunk_id: &str,
    ) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!(
                "/api/v1/document-store/chunks/{}/{}/{}",
                seg(store_id),
                seg(loader_id),
                seg(chunk_id)
            ),
            Vec::new(),
            None,
        )
        .await
    }

    // --- document operations ---

    /// Upsert a document into a store. The component configs are
    /// pre-serialized JSON text parsed here and relayed as objects.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_document(
        &self,
        store_id: &str,
        loader: Option<&str>,
        splitter: Option<&str>,
        embedding: Option<&str>,
        vector_store: Option<&str>,
        record_manager: Option<&str>,
        metadata: Option<&str>,
        replace_existing: bool,
        doc_id: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "docId", doc_id);
        put_value(&mut body, "loader", parse_json_opt("loader", loader)?);
        put_value(&mut body, "splitter", parse_json_opt("splitter", splitter)?);
        put_value(
            &mut body,
            "embedding",
            parse_json_opt("embedding", embedding)?,
        );
        put_value(
            &mut body,
            "vectorStore",
            parse_json_opt("vector_store", vector_store)?,
        );
        put_value(
            &mut body,
            "recordManager",
            parse_json_opt("record_manager", record_manager)?,
        );
        put_value(&mut body, "metadata", parse_json_opt("metadata", metadata)?);
        body.insert("replaceExisting".to_string(), json!(replace_existing));
        self.request(
            Method::POST,
            &format!("/api/v1/document-store/upsert/{}", seg(store_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    /// Re-process and upsert all documents in a store.
    pub async fn refresh_document_store(
        &self,
        store_id: &str,
        items: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_value(&mut body, "items", parse_json_opt("items", items)?);
        self.request(
            Method::POST,
            &format!("/api/v1/document-store/refresh/{}", seg(store_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    /// Run a retrieval query against a store's vector index.
    pub async fn query_document_store(
        &self,
        store_id: &str,
        query: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({ "storeId": store_id, "query": query });
        self.request(
            Method::POST,
            "/api/v1/document-store/vectorstore/query",
            Vec::new(),
            Some(body),
        )
        .await
    }

    pub async fn delete_document_loader(
        &self,
        store_id: &str,
        loader_id: &str,
    ) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!(
                "/api/v1/document-store/loader/{}/{}",
                seg(store_id),
                seg(loader_id)
            ),
            Vec::new(),
            None,
        )
        .await
    }

    pub async fn delete_vectorstore_data(&self, store_id: &str) -> Result<Value, FlowiseError> {
        self.request(
            Method::DELETE,
            &format!("/api/v1/document-store/vectorstore/{}", seg(store_id)),
            Vec::new(),
            None,
        )
        .await
    }

    // --- chat messages ---

    /// List chat messages for a chatflow; filters ride as query parameters and
    /// are omitted entirely when unset.
    #[allow(clippy::too_many_arguments)]
    pub async fn list_chat_messages(
        &self,
        chatflow_id: &str,
        chat_type: Option<&str>,
        order: Option<&str>,
        chat_id: Option<&str>,
        session_id: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut query = Vec::new();
        push_opt(&mut query, "chatType", chat_type);
        push_opt(&mut query, "order", order);
        push_opt(&mut query, "chatId", chat_id);
        push_opt(&mut query, "sessionId", session_id);
        push_opt(&mut query, "startDate", start_date);
        push_opt(&mut query, "endDate", end_date);
        self.request(
            Method::GET,
            &format!("/api/v1/chatmessage/{}", seg(chatflow_id)),
            query,
            None,
        )
        .await
    }

    pub async fn delete_chat_messages(
        &self,
        chatflow_id: &str,
        chat_id: Option<&str>,
        chat_type: Option<&str>,
        session_id: Option<&str>,
        hard_delete: bool,
    ) -> Result<Value, FlowiseError> {
        let mut query = Vec::new();
        push_opt(&mut query, "chatId", chat_id);
        push_opt(&mut query, "chatType", chat_type);
        push_opt(&mut query, "sessionId", session_id);
        query.push(("hardDelete", hard_delete.to_string()));
        self.request(
            Method::DELETE,
            &format!("/api/v1/chatmessage/{}", seg(chatflow_id)),
            query,
            None,
        )
        .await
    }

    // --- feedback ---

    pub async fn list_feedback(
        &self,
        chatflow_id: &str,
        chat_id: Option<&str>,
        sort_order: &str,
    ) -> Result<Value, FlowiseError> {
        let mut query = Vec::new();
        push_opt(&mut query, "chatId", chat_id);
        query.push(("sortOrder", sort_order.to_string()));
        self.request(
            Method::GET,
            &format!("/api/v1/feedback/{}", seg(chatflow_id)),
            query,
            None,
        )
        .await
    }

    pub async fn create_feedback(
        &self,
        chatflow_id: &str,
        chat_id: &str,
        message_id: &str,
        rating: &str,
        content: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({
            "chatflowid": chatflow_id,
            "chatId": chat_id,
            "messageId": message_id,
            "rating": rating,
            "content": content,
        });
        self.request(Method::POST, "/api/v1/feedback", Vec::new(), Some(body))
            .await
    }

    pub async fn update_feedback(
        &self,
        feedback_id: &str,
        rating: Option<&str>,
        content: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "rating", rating);
        put_str(&mut body, "content", content);
        self.request(
            Method::PUT,
            &format!("/api/v1/feedback/{}", seg(feedback_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    // --- leads ---

    pub async fn list_leads(&self, chatflow_id: &str) -> Result<Value, FlowiseError> {
        self.get(&format!("/api/v1/leads/{}", seg(chatflow_id)))
            .await
    }

    pub async fn create_lead(
        &self,
        chatflow_id: &str,
        chat_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        body.insert("chatflowid".to_string(), json!(chatflow_id));
        body.insert("chatId".to_string(), json!(chat_id));
        put_str(&mut body, "name", name);
        put_str(&mut body, "email", email);
        put_str(&mut body, "phone", phone);
        self.request(
            Method::POST,
            "/api/v1/leads",
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    // --- vector upsert ---

    pub async fn upsert_vector(
        &self,
        chatflow_id: &str,
        stop_node_id: Option<&str>,
        override_config: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_str(&mut body, "stopNodeId", stop_node_id);
        put_value(
            &mut body,
            "overrideConfig",
            parse_json_opt("override_config", override_config)?,
        );
        self.request(
            Method::POST,
            &format!("/api/v1/vector/upsert/{}", seg(chatflow_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    // --- upsert history ---

    pub async fn list_upsert_history(
        &self,
        chatflow_id: &str,
        order: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut query = vec![("order", order.to_string())];
        push_opt(&mut query, "startDate", start_date);
        push_opt(&mut query, "endDate", end_date);
        self.request(
            Method::GET,
            &format!("/api/v1/upsert-history/{}", seg(chatflow_id)),
            query,
            None,
        )
        .await
    }

    /// Soft-delete upsert history records. `ids` is pre-serialized JSON text
    /// holding an array of record ids.
    pub async fn delete_upsert_history(
        &self,
        chatflow_id: &str,
        ids: Option<&str>,
    ) -> Result<Value, FlowiseError> {
        let mut body = Map::new();
        put_value(&mut body, "ids", parse_json_opt("ids", ids)?);
        self.request(
            Method::PATCH,
            &format!("/api/v1/upsert-history/{}", seg(chatflow_id)),
            Vec::new(),
            Some(Value::Object(body)),
        )
        .await
    }

    // --- credentials ---

    pub async fn list_credentials(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/credentials").await
    }

    /// Create a credential. `encrypted_data` is pre-serialized JSON text.
    pub async fn create_credential(
        &self,
        name: &str,
        credential_name: &str,
        encrypted_data: &str,
    ) -> Result<Value, FlowiseError> {
        let body = json!({
            "name": name,
            "credentialName": credential_name,
            "encryptedData": parse_json("encrypted_data", encrypted_data)?,
        });
        self.request(Method::POST, "/api/v1/credentials", Vec::new(), Some(body))
            .await
    }

    // --- marketplace ---

    pub async fn list_marketplace_templates(&self) -> Result<Value, FlowiseError> {
        self.get("/api/v1/marketplaces/templates").await
    }
}

// --- parameter and body helpers ---

/// Percent-encode one path segment, exactly once.
fn seg(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Parse a pre-serialized JSON parameter into a structured value. A parse
/// failure is a client-side error; nothing is sent to the remote side.
fn parse_json(name: &str, raw: &str) -> Result<Value, FlowiseError> {
    serde_json::from_str(raw).map_err(|e| FlowiseError::InvalidParameter {
        name: name.to_string(),
        message: format!("not valid JSON: {}", e),
    })
}

fn parse_json_opt(name: &str, raw: Option<&str>) -> Result<Option<Value>, FlowiseError> {
    raw.map(|r| parse_json(name, r)).transpose()
}

/// Validate a pre-serialized JSON parameter and return it in canonical form,
/// for fields Flowise stores as stringified JSON (flow graphs, tool schemas).
fn validate_json_text(name: &str, raw: &str) -> Result<String, FlowiseError> {
    Ok(parse_json(name, raw)?.to_string())
}

fn validate_json_text_opt(name: &str, raw: Option<&str>) -> Result<Option<String>, FlowiseError> {
    raw.map(|r| validate_json_text(name, r)).transpose()
}

fn put_str(body: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        body.insert(key.to_string(), json!(value));
    }
}

fn put_bool(body: &mut Map<String, Value>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        body.insert(key.to_string(), json!(value));
    }
}

fn put_value(body: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value);
    }
}

fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

/// Fold a server-sent event stream into one aggregate JSON value.
///
/// Flowise streams prediction output as `data:` frames carrying
/// `{"event":"token","data":"..."}` objects plus occasional metadata events.
/// Token payloads are concatenated into a `text` field; object payloads of
/// other events are merged in alongside it. A body with no `data:` frames is
/// decoded as one plain JSON value.
fn aggregate_event_stream(raw: &str) -> Value {
    let mut text = String::new();
    let mut extra = Map::new();
    let mut saw_frame = false;

    for line in raw.lines() {
        let payload = match line.trim().strip_prefix("data:") {
            Some(p) => p.trim(),
            None => continue,
        };
        if payload.is_empty() || payload == "[DONE]" {
            continue;
        }
        saw_frame = true;
        match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(event)) => match event.get("event").and_then(Value::as_str) {
                Some("token") => {
                    if let Some(token) = event.get("data").and_then(Value::as_str) {
                        text.push_str(token);
                    }
                }
                Some("start") | Some("end") => {}
                _ => {
                    if let Some(Value::Object(data)) = event.get("data") {
                        for (k, v) in data {
                            extra.insert(k.clone(), v.clone());
                        }
                    }
                }
            },
            Ok(Value::String(s)) => text.push_str(&s),
            Ok(_) => {}
            Err(_) => text.push_str(payload),
        }
    }

    if !saw_frame {
        return serde_json::from_str(raw).unwrap_or(Value::String(raw.to_string()));
    }

    let mut result = extra;
    result.insert("text".to_string(), Value::String(text));
    Value::Object(result)
}
