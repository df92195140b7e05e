//! Bridge client tests.
//!
//! No sidecar runs here: reachable-behavior is covered by pointing the
//! client at a closed local port and asserting clean failures.

use marvin::responder::OutboundSender;
use marvin::whatsapp::{BridgeClient, BridgeError};

/// A base URL on a port nothing listens on.
async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn client_reports_base_url() {
    let client = BridgeClient::new("http://127.0.0.1:3000");
    assert_eq!(client.base_url(), "http://127.0.0.1:3000");
}

#[tokio::test]
async fn status_against_dead_port_is_http_error() {
    let client = BridgeClient::new(dead_base_url().await);
    let result = client.status().await;
    assert!(matches!(result, Err(BridgeError::Http(_))));
}

#[tokio::test]
async fn is_ready_against_dead_port_is_false() {
    let client = BridgeClient::new(dead_base_url().await);
    assert!(!client.is_ready().await);
}

#[tokio::test]
async fn send_text_against_dead_port_is_error() {
    let client = BridgeClient::new(dead_base_url().await);
    let result = client.send_text("917099073276@c.us", "hello").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn outbound_sender_impl_delegates_to_send_text() {
    let client = BridgeClient::new(dead_base_url().await);
    let sender: &dyn OutboundSender = &client;
    let result = sender.send_message("917099073276@c.us", "hello").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn get_qr_against_dead_port_is_error() {
    let client = BridgeClient::new(dead_base_url().await);
    assert!(client.get_qr().await.is_err());
}
