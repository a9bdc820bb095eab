//! Collaborators against local stand-ins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cvpipeline::collaborators::{AnalyticsSink, TagManager, VisitCount, VisitCounter};
use cvpipeline::error::CollaboratorError;
use cvpipeline::observability::EventEmitter;

/// Serves exactly one HTTP response and returns the URL to hit.
async fn serve_once(status: &'static str, body: &'static str) -> String {
    serve_body(status, body.to_string(), true).await
}

/// Like [`serve_once`]; without a length the body runs until the socket closes.
async fn serve_body(status: &'static str, body: String, with_length: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0_u8; 1024];
        let _ = socket.read(&mut buf).await;
        let length = if with_length {
            format!("content-length: {}\r\n", body.len())
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n{length}connection: close\r\n\r\n{body}"
        );
        // The client may hang up once it has seen enough.
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    format!("http://{addr}/count")
}

fn oversized_body() -> String {
    format!(r#"{{"count":1,"padding":"{}"}}"#, "x".repeat(128 * 1024))
}

fn counter(url: String) -> VisitCounter {
    VisitCounter::new(url, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn visits_loaded_from_counter() {
    let url = serve_once("200 OK", r#"{"id":1,"name":"portfolio_visits","count":77}"#).await;
    assert_eq!(counter(url).load().await, VisitCount::Loaded(77));
}

#[tokio::test]
async fn visits_accepts_numeric_string() {
    let url = serve_once("200 OK", r#"{"count":"12"}"#).await;
    assert_eq!(counter(url).fetch().await.unwrap(), 12);
}

#[tokio::test]
async fn visits_server_error_stays_loading() {
    let url = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
    let counter = counter(url);
    assert!(matches!(
        counter.fetch().await,
        Err(CollaboratorError::Http(_))
    ));
}

#[tokio::test]
async fn visits_missing_count_stays_loading() {
    let url = serve_once("200 OK", r#"{"id":1}"#).await;
    let counter = counter(url);
    assert!(matches!(
        counter.fetch().await,
        Err(CollaboratorError::MissingCount)
    ));
}

#[tokio::test]
async fn visits_garbage_body_stays_loading() {
    let url = serve_once("200 OK", "<html>nope</html>").await;
    assert_eq!(counter(url).load().await, VisitCount::Loading);
}

#[tokio::test]
async fn visits_oversized_body_with_length_is_refused() {
    let url = serve_body("200 OK", oversized_body(), true).await;
    let err = counter(url).fetch().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Decode(ref m) if m.contains("byte limit")), "{err}");
}

#[tokio::test]
async fn visits_oversized_streamed_body_is_refused() {
    let url = serve_body("200 OK", oversized_body(), false).await;
    let err = counter(url).fetch().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Decode(ref m) if m.contains("byte limit")), "{err}");
}

#[tokio::test]
async fn visits_streamed_body_within_limit_is_read() {
    let url = serve_body("200 OK", r#"{"count":5}"#.to_string(), false).await;
    assert_eq!(counter(url).fetch().await.unwrap(), 5);
}

#[tokio::test]
async fn visits_timeout_stays_loading() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept and never answer.
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    let counter = VisitCounter::new(format!("http://{addr}/count"), Duration::from_millis(200))
        .unwrap();
    assert_eq!(counter.load().await, VisitCount::Loading);
}

#[tokio::test]
async fn analytics_bootstrap_writes_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let events = Arc::new(EventEmitter::from_file(&path).unwrap());
    let tags = TagManager::new("GTM-TEST01", Arc::clone(&events));

    tags.bootstrap(Utc::now()).await.unwrap();
    assert_eq!(events.event_count(), 1);
    drop(tags);
    drop(events);

    let content = std::fs::read_to_string(&path).unwrap();
    let event: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(event["type"], "AnalyticsBootstrapped");
    assert_eq!(event["container_id"], "GTM-TEST01");
    assert!(
        event["script_url"]
            .as_str()
            .unwrap()
            .ends_with("id=GTM-TEST01")
    );
    assert_eq!(event["data_layer"]["event"], "gtm.js");
    assert!(event["data_layer"]["gtm.start"].is_number());
}
