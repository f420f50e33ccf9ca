//! Streaming decode of HTTP response bodies served by a local axum server

use axum::{
    body::{Body, Bytes},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::StreamExt;
use json_stream::http::{build_client, open_body, FetchError, DEFAULT_FETCH_TIMEOUT};
use json_stream::{spawn_decoder, StreamError, DEFAULT_CHANNEL_CAPACITY};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

#[derive(Debug, Deserialize, PartialEq)]
struct Entry {
    id: String,
}

async fn serve_entries() -> impl IntoResponse {
    let body = format!(
        "[{}]",
        (1..=250)
            .map(|i| format!(r#"{{"id": "{i:05}"}}"#))
            .collect::<Vec<_>>()
            .join(",")
    );
    (StatusCode::OK, [("Content-Type", "application/json")], body)
}

async fn serve_broken() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/json")],
        r#"[{"id": "00001"}, {"id": 2]"#,
    )
}

/// Sends the first element, then stalls well past any test timeout.
async fn serve_stalled() -> impl IntoResponse {
    let head = futures::stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(br#"[{"id": "00001"}, "#)) });
    let tail = futures::stream::once(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Bytes::from_static(br#"{"id": "00002"}]"#))
    });
    (
        StatusCode::OK,
        [("Content-Type", "application/json")],
        Body::from_stream(head.chain(tail)),
    )
}

async fn start_test_server() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/entries.json", get(serve_entries))
        .route("/broken.json", get(serve_broken))
        .route("/stalled.json", get(serve_stalled));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok(format!("http://{addr}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn streams_http_body_element_by_element() {
    let base = start_test_server().await.unwrap();
    let client = build_client(DEFAULT_FETCH_TIMEOUT).unwrap();
    let url = Url::parse(&format!("{base}/entries.json")).unwrap();

    let reader = open_body(&client, &url).await.unwrap();
    let mut entries = spawn_decoder::<Entry, _>(reader, DEFAULT_CHANNEL_CAPACITY);

    let mut ids = Vec::new();
    while let Some(entry) = entries.next().await {
        ids.push(entry.id);
    }
    assert_eq!(entries.finish().await.unwrap(), 250);
    assert_eq!(ids.first().map(String::as_str), Some("00001"));
    assert_eq!(ids.last().map(String::as_str), Some("00250"));
}

#[tokio::test(flavor = "multi_thread")]
async fn non_success_status_is_a_fetch_error() {
    let base = start_test_server().await.unwrap();
    let client = build_client(DEFAULT_FETCH_TIMEOUT).unwrap();
    let url = Url::parse(&format!("{base}/missing.json")).unwrap();

    match open_body(&client, &url).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a status error"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_a_decode_error() {
    let base = start_test_server().await.unwrap();
    let client = build_client(DEFAULT_FETCH_TIMEOUT).unwrap();
    let url = Url::parse(&format!("{base}/broken.json")).unwrap();

    let reader = open_body(&client, &url).await.unwrap();
    let mut entries = spawn_decoder::<Entry, _>(reader, DEFAULT_CHANNEL_CAPACITY);
    assert!(entries.next().await.is_some());
    assert!(entries.next().await.is_none());
    assert!(matches!(
        entries.finish().await,
        Err(StreamError::Decode { index: 1, .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn body_timeout_is_a_transport_error() {
    let base = start_test_server().await.unwrap();
    let client = build_client(Duration::from_millis(500)).unwrap();
    let url = Url::parse(&format!("{base}/stalled.json")).unwrap();

    let reader = open_body(&client, &url).await.unwrap();
    let mut entries = spawn_decoder::<Entry, _>(reader, DEFAULT_CHANNEL_CAPACITY);
    assert!(entries.next().await.is_some());
    assert!(entries.next().await.is_none());

    let err = entries.finish().await.unwrap_err();
    assert!(matches!(err, StreamError::Io(_)), "{err}");
    let transport = err.into_transport().unwrap();
    assert!(transport.is_timeout() || transport.is_body(), "{transport}");
}

#[test]
fn decode_errors_are_not_transport_errors() {
    let source = serde_json::from_str::<Entry>("{").unwrap_err();
    let err = StreamError::Decode { index: 0, source };
    assert!(matches!(err.into_transport(), Err(StreamError::Decode { .. })));

    let err = StreamError::Io(std::io::Error::other("disk"));
    assert!(matches!(err.into_transport(), Err(StreamError::Io(_))));
}
