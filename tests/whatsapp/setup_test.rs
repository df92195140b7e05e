//! Pairing setup tests: QR decode/save and upload failure handling.

use marvin::whatsapp::setup::{save_qr_png, upload_qr};

#[tokio::test]
async fn save_qr_png_decodes_and_writes_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("qr.png");

    // "hello" in base64; content is opaque to the saver.
    save_qr_png("aGVsbG8=", &path).await.expect("should save");

    let written = std::fs::read(&path).expect("file should exist");
    assert_eq!(written, b"hello");
}

#[tokio::test]
async fn save_qr_png_tolerates_surrounding_whitespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("qr.png");

    save_qr_png("  aGVsbG8=\n", &path).await.expect("should save");
    assert_eq!(std::fs::read(&path).expect("file"), b"hello");
}

#[tokio::test]
async fn save_qr_png_rejects_invalid_base64() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("qr.png");

    let result = save_qr_png("!!! not base64 !!!", &path).await;
    assert!(result.is_err());
    assert!(!path.exists());
}

#[tokio::test]
async fn upload_qr_missing_file_is_error() {
    let result = upload_qr("http://127.0.0.1:9/upload", std::path::Path::new("/nonexistent/qr.png")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn upload_qr_dead_endpoint_is_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("qr.png");
    std::fs::write(&path, b"png bytes").expect("write");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let result = upload_qr(&format!("http://{addr}/upload"), &path).await;
    assert!(result.is_err());
}
