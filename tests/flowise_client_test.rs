//! Integration tests for the Flowise HTTP client against a loopback server.
//!
//! Covers:
//! - response decoding and auth header injection
//! - path identifier substitution
//! - client-side JSON validation (no request leaves the process)
//! - optional parameter omission and body round-trips
//! - remote error and timeout mapping
//! - concurrent in-flight requests over the shared session
//! - streaming prediction aggregation
//! - close idempotence

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use flowise_mcp::{FlowiseClient, FlowiseError, Settings};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
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

fn settings_for(addr: SocketAddr) -> Settings {
    Settings {
        endpoint: format!("http://{}", addr),
        api_key: Some("test-key".to_string()),
        log_level: log::LevelFilter::Off,
        request_timeout: Duration::from_secs(5),
    }
}

fn client_for(addr: SocketAddr) -> FlowiseClient {
    FlowiseClient::new(&settings_for(addr)).unwrap()
}

#[tokio::test]
async fn ping_returns_decoded_body() {
    let app = Router::new().route(
        "/api/v1/ping",
        get(|| async { Json(json!({"status": "ok"})) }),
    );
    let client = client_for(spawn_server(app).await);

    let health = client.ping().await.unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn requests_carry_bearer_token() {
    let app = Router::new().route(
        "/api/v1/ping",
        get(|headers: HeaderMap| async move {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Json(json!({ "auth": auth }))
        }),
    );
    let client = client_for(spawn_server(app).await);

    let seen = client.ping().await.unwrap();
    assert_eq!(seen, json!({"auth": "Bearer test-key"}));
}

#[tokio::test]
async fn path_identifiers_are_substituted_verbatim() {
    let app = Router::new().route(
        "/api/v1/nodes/{name}",
        get(|Path(name): Path<String>| async move { Json(json!({ "name": name })) }),
    );
    let client = client_for(spawn_server(app).await);

    // A segment needing escaping must arrive decoded back to the original,
    // i.e. encoded exactly once on the way out.
    let node = client.get_node("chat OpenAI").await.unwrap();
    assert_eq!(node, json!({"name": "chat OpenAI"}));
}

#[tokio::test]
async fn not_found_maps_to_remote_error() {
    let app = Router::new().route(
        "/api/v1/chatflows/{id}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))) }),
    );
    let client = client_for(spawn_server(app).await);

    let err = client.get_chatflow("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("not found"));
    let structured = err.to_value();
    assert_eq!(structured["error"]["status"], 404);
    assert_eq!(structured["error"]["message"], "not found");
}

#[tokio::test]
async fn invalid_json_parameter_never_hits_the_network() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let app = Router::new().fallback(move || {
        let counted = counted.clone();
        async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Json(json!({}))
        }
    });
    let client = client_for(spawn_server(app).await);

    let err = client
        .create_chatflow("flow", "{not json", "", "CHATFLOW")
        .await
        .unwrap_err();
    assert!(matches!(err, FlowiseError::InvalidParameter { .. }));

    let err = client
        .upsert_vector("cf-1", None, Some("[broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowiseError::InvalidParameter { .. }));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn structured_parameter_round_trips_through_request_body() {
    let app = Router::new().route(
        "/api/v1/vector/upsert/{id}",
        post(|Json(body): Json<Value>| async move { Json(body) }),
    );
    let client = client_for(spawn_server(app).await);

    let original = json!({"temperature": 0.5, "models": ["a", "b"], "nested": {"k": 1}});
    let raw = serde_json::to_string(&original).unwrap();
    let echoed = client
        .upsert_vector("cf-1", Some("node-1"), Some(&raw))
        .await
        .unwrap();
    assert_eq!(echoed["overrideConfig"], original);
    assert_eq!(echoed["stopNodeId"], "node-1");
}

#[tokio::test]
async fn unset_optional_fields_are_omitted_from_body() {
    let app = Router::new().route(
        "/api/v1/chatflows/{id}",
        put(|Json(body): Json<Value>| async move { Json(body) }),
    );
    let client = client_for(spawn_server(app).await);

    let echoed = client
        .update_chatflow("cf-1", Some("renamed"), None, None, None, None, None, None)
        .await
        .unwrap();
    assert_eq!(echoed, json!({"name": "renamed"}));

    // An empty string is a real value, not "unset".
    let echoed = client
        .update_chatflow("cf-1", None, None, Some(""), Some(true), None, None, None)
        .await
        .unwrap();
    assert_eq!(echoed, json!({"description": "", "deployed": true}));
}

#[tokio::test]
async fn empty_success_body_decodes_as_null() {
    let app = Router::new().route(
        "/api/v1/chatflows/{id}",
        delete(|| async { StatusCode::OK }),
    );
    let client = client_for(spawn_server(app).await);

    let deleted = client.delete_chatflow("cf-1").await.unwrap();
    assert_eq!(deleted, Value::Null);
}

#[tokio::test]
async fn slow_responses_map_to_timeout_error() {
    let app = Router::new().route(
        "/api/v1/ping",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"status": "ok"}))
        }),
    );
    let addr = spawn_server(app).await;
    let mut settings = settings_for(addr);
    settings.request_timeout = Duration::from_millis(200);
    let client = FlowiseClient::new(&settings).unwrap();

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, FlowiseError::Timeout(_)), "got: {}", err);
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_transport_error() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr);

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, FlowiseError::Transport(_)), "got: {}", err);
}

#[tokio::test]
async fn concurrent_calls_share_one_session_without_crosstalk() {
    let app = Router::new().route(
        "/api/v1/chatflows/{id}",
        get(|Path(id): Path<String>| async move {
            // Stagger completion so responses come back out of issue order.
            let ms = id.parse::<u64>().unwrap_or(0) * 7 % 40;
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Json(json!({ "id": id }))
        }),
    );
    let client = Arc::new(client_for(spawn_server(app).await));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let flow = client.get_chatflow(&i.to_string()).await.unwrap();
                (i, flow)
            })
        })
        .collect();

    for handle in handles {
        let (i, flow) = handle.await.unwrap();
        assert_eq!(flow["id"], i.to_string());
    }
}

#[tokio::test]
async fn streaming_prediction_aggregates_to_the_non_streaming_answer() {
    let app = Router::new().route(
        "/api/v1/prediction/{id}",
        post(|Json(body): Json<Value>| async move {
            if body.get("streaming") == Some(&json!(true)) {
                let frames = concat!(
                    "data:{\"event\":\"token\",\"data\":\"The answer\"}\n\n",
                    "data:{\"event\":\"token\",\"data\":\" is 42.\"}\n\n",
                    "data:{\"event\":\"metadata\",\"data\":{\"chatId\":\"c-1\"}}\n\n",
                );
                ([(header::CONTENT_TYPE, "text/event-stream")], frames).into_response()
            } else {
                Json(json!({"text": "The answer is 42.", "chatId": "c-1"})).into_response()
            }
        }),
    );
    let client = client_for(spawn_server(app).await);

    let streamed = client
        .create_prediction("cf-1", "what is the answer?", None, None, true)
        .await
        .unwrap();
    let whole = client
        .create_prediction("cf-1", "what is the answer?", None, None, false)
        .await
        .unwrap();
    assert_eq!(streamed, whole);
    assert_eq!(streamed["text"], "The answer is 42.");
}

#[tokio::test]
async fn create_variable_sends_explicit_defaults() {
    let app = Router::new().route(
        "/api/v1/variables",
        post(|Json(body): Json<Value>| async move { Json(body) }),
    );
    let client = client_for(spawn_server(app).await);

    let echoed = client.create_variable("MY_VAR", "", "string").await.unwrap();
    assert_eq!(echoed, json!({"name": "MY_VAR", "value": "", "type": "string"}));
}

#[test]
fn close_is_idempotent() {
    let client = FlowiseClient::new(&Settings::default()).unwrap();
    assert!(!client.is_closed());
    client.close();
    client.close();
    assert!(client.is_closed());
}
