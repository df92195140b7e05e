//! HTTP response checking, sanitization, and truncation tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use marvin::providers::{check_http_response, ProviderError};

/// Serve a single canned HTTP response on a random local port.
async fn serve_once(status_line: &str, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose addr");

    let status_line_owned = status_line.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut read_buf = [0_u8; 1024];
            let _ = socket.read(&mut read_buf).await;

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    format!("http://{addr}/")
}

#[tokio::test]
async fn success_returns_raw_body() {
    let url = serve_once("200 OK", "{\"ok\":true}").await;
    let response = reqwest::get(url).await.expect("request should complete");

    let body = check_http_response(response)
        .await
        .expect("2xx should pass through");
    assert_eq!(body, "{\"ok\":true}");
}

#[tokio::test]
async fn error_status_redacts_key_like_values() {
    let raw_key = "gsk_abcdefghijklmnopqrstuvwxyz123456";
    let body = format!("invalid api key: {raw_key}");
    let url = serve_once("401 Unauthorized", &body).await;

    let response = reqwest::get(url).await.expect("request should complete");
    let err = check_http_response(response)
        .await
        .expect_err("non-2xx should fail");

    match err {
        ProviderError::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(!body.contains(raw_key));
            assert!(body.contains("[REDACTED]"));
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn error_status_truncates_long_body() {
    let body = "x".repeat(1000);
    let url = serve_once("500 Internal Server Error", &body).await;

    let response = reqwest::get(url).await.expect("request should complete");
    let err = check_http_response(response)
        .await
        .expect_err("non-2xx should fail");

    match err {
        ProviderError::HttpStatus { body, .. } => {
            assert!(body.ends_with("...[truncated]"));
            assert!(body.len() < 300);
        }
        other => panic!("expected http status error, got: {other}"),
    }
}

#[tokio::test]
async fn error_body_whitespace_is_collapsed() {
    let url = serve_once("503 Service Unavailable", "over\n   capacity\ttoday").await;

    let response = reqwest::get(url).await.expect("request should complete");
    let err = check_http_response(response)
        .await
        .expect_err("non-2xx should fail");

    match err {
        ProviderError::HttpStatus { body, .. } => {
            assert_eq!(body, "over capacity today");
        }
        other => panic!("expected http status error, got: {other}"),
    }
}
