//! Integration tests for the tool catalog and dispatch layer.
//!
//! The dispatcher is driven through the `ToolProtocol` trait exactly the way
//! the stdio transport drives it, against a loopback Flowise stand-in.

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use flowise_mcp::tool_protocol::ToolProtocol;
use flowise_mcp::{FlowiseClient, FlowiseToolServer, Settings};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn tool_server(addr: SocketAddr) -> FlowiseToolServer {
    let settings = Settings {
        endpoint: format!("http://{}", addr),
        api_key: None,
        log_level: log::LevelFilter::Off,
        request_timeout: Duration::from_secs(5),
    };
    FlowiseToolServer::new(Arc::new(FlowiseClient::new(&settings).unwrap()))
}

fn offline_tool_server() -> FlowiseToolServer {
    FlowiseToolServer::new(Arc::new(FlowiseClient::new(&Settings::default()).unwrap()))
}

#[test]
fn catalog_exposes_all_fifty_tools_with_schemas() {
    let server = offline_tool_server();
    let tools = server.list_tools();
    assert_eq!(tools.len(), 50);
    for tool in &tools {
        assert!(!tool.description.is_empty(), "{} lacks a description", tool.name);
        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
    }
    // Spot-check a signature.
    let prediction = tools.iter().find(|t| t.name == "create_prediction").unwrap();
    let schema = prediction.input_schema();
    assert_eq!(schema["required"], json!(["chatflow_id", "question"]));
    assert_eq!(schema["properties"]["streaming"]["default"], json!(false));
}

#[tokio::test]
async fn unknown_tool_is_a_dispatch_error() {
    let server = offline_tool_server();
    let result = server.execute("teleport", json!({})).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("teleport"));
}

#[tokio::test]
async fn missing_required_argument_is_a_dispatch_error() {
    let server = offline_tool_server();
    let result = server.execute("get_chatflow", json!({})).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("chatflow_id"));
}

#[tokio::test]
async fn non_object_arguments_are_rejected() {
    let server = offline_tool_server();
    assert!(server.execute("ping", json!("not an object")).await.is_err());
    // Null stands for "no arguments" and is accepted for no-parameter tools.
    // (It still fails later only if the network is down, which is a ToolResult,
    // not a dispatch error — so use a tool that fails argument extraction.)
    assert!(server.execute("get_chatflow", Value::Null).await.is_err());
}

#[tokio::test]
async fn create_variable_fills_documented_defaults() {
    let app = Router::new().route(
        "/api/v1/variables",
        post(|Json(body): Json<Value>| async move { Json(body) }),
    );
    let server = tool_server(spawn_server(app).await);

    let result = server
        .execute("create_variable", json!({"name": "MY_VAR"}))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(
        result.output,
        json!({"name": "MY_VAR", "value": "", "type": "string"})
    );
}

#[tokio::test]
async fn create_chatflow_defaults_to_empty_graph() {
    let app = Router::new().route(
        "/api/v1/chatflows",
        post(|Json(body): Json<Value>| async move { Json(body) }),
    );
    let server = tool_server(spawn_server(app).await);

    let result = server
        .execute("create_chatflow", json!({"name": "fresh flow"}))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.output["flowData"], "{}");
    assert_eq!(result.output["type"], "CHATFLOW");
    assert_eq!(result.output["description"], "");
}

#[tokio::test]
async fn remote_failure_becomes_structured_tool_result() {
    let app = Router::new().route(
        "/api/v1/chatflows/{id}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))) }),
    );
    let server = tool_server(spawn_server(app).await);

    let result = server
        .execute("get_chatflow", json!({"chatflow_id": "missing"}))
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.output["error"]["status"], 404);
    assert_eq!(result.output["error"]["message"], "not found");
    assert!(result.error.unwrap().contains("404"));
}

#[tokio::test]
async fn invalid_json_argument_becomes_structured_tool_result() {
    let server = offline_tool_server();
    let result = server
        .execute(
            "create_prediction",
            json!({"chatflow_id": "cf", "question": "hi", "override_config": "{oops"}),
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.output["error"]["kind"], "invalid_parameter");
    assert_eq!(result.output["error"]["parameter"], "override_config");
}

#[tokio::test]
async fn chatflow_listing_is_summarized() {
    let app = Router::new().route(
        "/api/v1/chatflows",
        get(|| async {
            Json(json!([
                {"id": "1", "name": "alpha", "type": "CHATFLOW", "flowData": "{...}", "deployed": true},
                {"id": "2", "name": "beta", "type": "MULTIAGENT", "flowData": "{...}"}
            ]))
        }),
    );
    let server = tool_server(spawn_server(app).await);

    let result = server.execute("list_chatflows", Value::Null).await.unwrap();
    assert_eq!(
        result.output,
        json!([
            {"id": "1", "name": "alpha", "type": "CHATFLOW"},
            {"id": "2", "name": "beta", "type": "MULTIAGENT"}
        ])
    );
}

#[tokio::test]
async fn shutdown_closes_the_shared_client() {
    let server = offline_tool_server();
    let client = Arc::clone(server.client());
    assert!(!client.is_closed());
    server.shutdown();
    assert!(client.is_closed());
    // Second shutdown must stay quiet.
    server.shutdown();
}
