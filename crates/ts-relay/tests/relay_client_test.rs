//! RelayClient against an in-process relay: happy paths, every degradation
//! path, and the exact shape of what goes over the wire.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use ts_relay::{Relay, RelayClient, RelayError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Hit {
    path: &'static str,
    headers: HeaderMap,
    body: String,
}

#[derive(Default)]
struct FakeRelay {
    status: Mutex<Value>,
    payload: Mutex<Value>,
    hits: Mutex<Vec<Hit>>,
}

impl FakeRelay {
    fn record(&self, path: &'static str, headers: HeaderMap, body: String) {
        self.hits.lock().unwrap().push(Hit {
            path,
            headers,
            body,
        });
    }

    fn hits(&self, path: &str) -> Vec<Hit> {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.path == path)
            .cloned()
            .collect()
    }
}

async fn status(State(relay): State<Arc<FakeRelay>>, headers: HeaderMap) -> Json<Value> {
    relay.record("/status", headers, String::new());
    Json(relay.status.lock().unwrap().clone())
}

async fn payload(State(relay): State<Arc<FakeRelay>>, headers: HeaderMap) -> Json<Value> {
    relay.record("/payload", headers, String::new());
    Json(relay.payload.lock().unwrap().clone())
}

async fn heartbeat(
    State(relay): State<Arc<FakeRelay>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    relay.record("/ext-heartbeat", headers, body);
    Json(json!({ "ok": true, "relay_version": "1.0.0" }))
}

async fn clear(State(relay): State<Arc<FakeRelay>>, headers: HeaderMap, body: String) -> Json<Value> {
    relay.record("/clear", headers, body);
    *relay.status.lock().unwrap() = json!({ "signal": "ok" });
    Json(json!({ "ok": true }))
}

/// Spin up a fake relay on a random port, return the base URL and its state.
async fn start_relay(status_doc: Value, payload_doc: Value) -> (String, Arc<FakeRelay>) {
    let relay = Arc::new(FakeRelay {
        status: Mutex::new(status_doc),
        payload: Mutex::new(payload_doc),
        hits: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .route("/status", get(status))
        .route("/payload", get(payload))
        .route("/ext-heartbeat", post(heartbeat))
        .route("/clear", post(clear))
        .with_state(relay.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), relay)
}

/// Start a server that answers every request with the given status and body.
async fn start_broken_relay(code: StatusCode, body: &'static str) -> String {
    let router = Router::new().fallback(move || async move { (code, body) });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// An address nothing listens on.
async fn dead_origin() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ===========================================================================
// Status
// ===========================================================================

#[tokio::test]
async fn status_reports_terminate_signal() {
    let (url, _relay) = start_relay(
        json!({ "signal": "terminate-chrome", "relay_version": "1.0.0" }),
        json!({}),
    )
    .await;
    let client = RelayClient::new(url);

    let reply = client.fetch_status().await;
    assert!(!reply.is_degraded());
    assert!(reply.value().is_terminate());
    assert_eq!(reply.value().relay_version.as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn status_request_bypasses_cache() {
    let (url, relay) = start_relay(json!({ "signal": "ok" }), json!({})).await;
    let client = RelayClient::new(url);

    client.fetch_status().await;
    let hits = relay.hits("/status");
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].headers.get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
}

#[tokio::test]
async fn empty_status_is_no_signal() {
    let (url, _relay) = start_relay(json!({}), json!({})).await;
    let reply = RelayClient::new(url).fetch_status().await;
    assert!(!reply.is_degraded());
    assert!(reply.value().signal.is_none());
}

#[tokio::test]
async fn unreachable_relay_degrades_to_no_signal() {
    let client = RelayClient::new(dead_origin().await);
    let reply = client.fetch_status().await;
    assert!(reply.is_degraded());
    assert!(!reply.value().is_terminate());
    assert!(matches!(reply.error(), Some(RelayError::Transport(_))));
}

#[tokio::test]
async fn server_error_degrades_to_no_signal() {
    let url = start_broken_relay(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let reply = RelayClient::new(url).fetch_status().await;
    assert_eq!(
        reply.error(),
        Some(&RelayError::Status {
            endpoint: "/status",
            status: 500
        })
    );
    assert!(reply.value().signal.is_none());
}

#[tokio::test]
async fn malformed_status_degrades_to_no_signal() {
    let url = start_broken_relay(StatusCode::OK, "terminate-chrome").await;
    let reply = RelayClient::new(url).fetch_status().await;
    assert!(matches!(reply.error(), Some(RelayError::Parse { .. })));
    assert!(!reply.value().is_terminate());
}

// ===========================================================================
// Payload
// ===========================================================================

#[tokio::test]
async fn payload_is_decoded() {
    let (url, _relay) = start_relay(
        json!({}),
        json!({ "battery_pct": 12, "drop_per_min": 3, "watts": 9 }),
    )
    .await;
    let reply = RelayClient::new(url).fetch_payload().await;
    assert!(!reply.is_degraded());
    assert_eq!(reply.value().battery_pct, Some(12.0));
    assert_eq!(reply.value().drop_per_min, Some(3.0));
    assert_eq!(reply.value().watts, Some(9.0));
}

#[tokio::test]
async fn payload_failure_yields_all_unknown() {
    let url = start_broken_relay(StatusCode::NOT_FOUND, "{\"error\":\"not found\"}").await;
    let reply = RelayClient::new(url).fetch_payload().await;
    assert!(reply.is_degraded());
    assert_eq!(reply.value().summary(), "Battery ?% • ?%/min • ?W");
}

// ===========================================================================
// Heartbeat and clear
// ===========================================================================

#[tokio::test]
async fn heartbeat_posts_version_json() {
    let (url, relay) = start_relay(json!({}), json!({})).await;
    let reply = RelayClient::new(url).send_heartbeat("1.0.0").await;
    assert!(!reply.is_degraded());

    let hits = relay.hits("/ext-heartbeat");
    assert_eq!(hits.len(), 1);
    let body: Value = serde_json::from_str(&hits[0].body).expect("json body");
    assert_eq!(body, json!({ "version": "1.0.0" }));
    assert_eq!(
        hits[0].headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
}

#[tokio::test]
async fn clear_posts_empty_body_and_resets_relay() {
    let (url, relay) = start_relay(json!({ "signal": "terminate-chrome" }), json!({})).await;
    let client = RelayClient::new(url);

    assert!(!client.send_clear().await.is_degraded());
    let hits = relay.hits("/clear");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].body.is_empty());

    assert!(!client.fetch_status().await.value().is_terminate());
}

#[tokio::test]
async fn fire_and_forget_calls_absorb_failures() {
    let client = RelayClient::new(dead_origin().await);
    assert!(client.send_heartbeat("1.0.0").await.is_degraded());
    assert!(client.send_clear().await.is_degraded());
}

#[tokio::test]
async fn slow_relay_times_out() {
    let router = Router::new().route(
        "/status",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "signal": "terminate-chrome" }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = RelayClient::with_timeout(format!("http://{addr}"), Duration::from_millis(100))
        .expect("client");
    let reply = client.fetch_status().await;
    assert_eq!(reply.error(), Some(&RelayError::Timeout));
    assert!(!reply.value().is_terminate());
}
