//! End-to-end tests: a real server on an ephemeral port driven by reqwest.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use jsonhub::api;
use jsonhub::app_state::AppState;
use jsonhub::config::HubConfig;

async fn spawn_server() -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let config = HubConfig {
        listen_addr: addr,
        ..HubConfig::default()
    };
    let app = api::build_app(AppState::new(config));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn url(addr: SocketAddr, params: &[(&str, &str)]) -> reqwest::Url {
    let Ok(url) = reqwest::Url::parse_with_params(&format!("http://{addr}/"), params) else {
        panic!("bad url");
    };
    url
}

async fn publish(client: &reqwest::Client, addr: SocketAddr, body: &str) {
    let request = client.post(url(addr, &[])).body(body.to_owned());
    let Ok(response) = request.send().await else {
        panic!("publish request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.ok().as_deref(), Some("Sent"));
}

/// Publishes until the stream yields a chunk containing `needle`, returning
/// everything read so far.
async fn publish_until_seen(
    client: &reqwest::Client,
    addr: SocketAddr,
    stream: &mut reqwest::Response,
    body: &str,
    needle: &str,
) -> String {
    let mut seen = String::new();
    let attempt = async {
        loop {
            publish(client, addr, body).await;
            let next = tokio::time::timeout(Duration::from_millis(100), stream.chunk());
            if let Ok(Ok(Some(chunk))) = next.await {
                seen.push_str(&String::from_utf8_lossy(&chunk));
                if seen.contains(needle) {
                    return;
                }
            }
        }
    };
    let outcome = tokio::time::timeout(Duration::from_secs(10), attempt).await;
    if outcome.is_err() {
        panic!("never saw {needle:?}");
    }
    seen
}

#[tokio::test]
async fn subscriber_receives_matching_message_as_sse_frame() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let spec = r#"{"kind": {"__match__": "case-insensitive", "value": "ALERT"}}"#;
    let Ok(mut stream) = client.get(url(addr, &[("q", spec)])).send().await else {
        panic!("subscribe request failed");
    };
    assert_eq!(stream.status(), reqwest::StatusCode::OK);
    let content_type = stream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/event-stream"));

    let message = "{\"kind\": \"alert\",\n\"n\": 1}";
    let seen = publish_until_seen(&client, addr, &mut stream, message, "\n\n").await;
    assert!(
        seen.contains("event: message\ndata: {\"kind\": \"alert\",\\n\"n\": 1}\n\n"),
        "unexpected frame: {seen:?}"
    );
}

#[tokio::test]
async fn ping_only_subscriber_receives_empty_object() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let secret = r#"{"secret": 1}"#;
    let params = [("q", secret), ("ping_only", "true")];
    let Ok(mut stream) = client.get(url(addr, &params)).send().await else {
        panic!("subscribe request failed");
    };
    let seen = publish_until_seen(&client, addr, &mut stream, secret, "\n\n").await;
    assert!(seen.contains("data: {}\n"), "unexpected frame: {seen:?}");
    assert!(!seen.contains("secret"));
}

#[tokio::test]
async fn spec_can_come_from_request_body() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let room = r#"{"room": "a"}"#;
    let request = client.get(url(addr, &[])).body(room);
    let Ok(mut stream) = request.send().await else {
        panic!("subscribe request failed");
    };
    let seen = publish_until_seen(&client, addr, &mut stream, room, "room").await;
    assert!(seen.contains(r#"data: {"room": "a"}"#));
}

#[tokio::test]
async fn malformed_spec_is_rejected() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let Ok(response) = client.get(url(addr, &[("q", "{not json")])).send().await else {
        panic!("subscribe request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("error body should be JSON");
    };
    assert_eq!(body.pointer("/error/code"), Some(&serde_json::json!(1001)));
}
