//! WhatsApp pairing setup: sidecar lifecycle and QR code publishing.
//!
//! The bridge sidecar runs as a Docker container managed with the
//! inspect-start-create pattern. Pairing works by fetching the QR code the
//! sidecar renders, saving it as `qr.png`, and uploading the PNG to a public
//! file host so the owner can scan it from anywhere.

use std::collections::HashMap;
use std::path::Path;

use base64::Engine;
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::Docker;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use super::client::BridgeClient;
use super::BridgeError;

/// Container name for the bridge sidecar.
pub const CONTAINER_NAME: &str = "marvin-bridge";

/// Port the bridge listens on inside and outside the container.
pub const BRIDGE_PORT: u16 = 3000;

/// Memory limit for the sidecar (768 MB; a headless browser lives in there).
const MEMORY_LIMIT_BYTES: i64 = 768 * 1024 * 1024;

/// Ensure the bridge sidecar container is running.
///
/// Inspect first; start it if it exists but is stopped; pull the image and
/// create it if missing.
///
/// # Errors
///
/// Returns [`BridgeError::SetupFailed`] when any Docker operation fails.
pub async fn ensure_container(docker: &Docker, image: &str) -> Result<(), BridgeError> {
    match docker.inspect_container(CONTAINER_NAME, None).await {
        Ok(info) => {
            let running = info.state.as_ref().and_then(|s| s.running).unwrap_or(false);
            if running {
                info!(container = CONTAINER_NAME, "bridge sidecar already running");
                return Ok(());
            }
            start_container(docker).await?;
            info!(container = CONTAINER_NAME, "bridge sidecar started");
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            create_and_start(docker, image).await?;
            info!(container = CONTAINER_NAME, image, "bridge sidecar created and started");
            Ok(())
        }
        Err(e) => Err(BridgeError::SetupFailed(format!(
            "failed to inspect container: {e}"
        ))),
    }
}

async fn start_container(docker: &Docker) -> Result<(), BridgeError> {
    docker
        .start_container(CONTAINER_NAME, None::<StartContainerOptions<String>>)
        .await
        .map_err(|e| BridgeError::SetupFailed(format!("failed to start container: {e}")))
}

async fn create_and_start(docker: &Docker, image: &str) -> Result<(), BridgeError> {
    // Pull the image; warnings are non-fatal (the image may exist locally).
    let pull_opts = CreateImageOptions {
        from_image: image,
        ..Default::default()
    };
    let mut pull_stream = docker.create_image(Some(pull_opts), None, None);
    while let Some(result) = pull_stream.next().await {
        if let Err(e) = result {
            warn!(error = %e, "image pull warning");
        }
    }

    let port_key = format!("{BRIDGE_PORT}/tcp");
    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        port_key.clone(),
        Some(vec![PortBinding {
            host_ip: Some("127.0.0.1".to_owned()),
            host_port: Some(BRIDGE_PORT.to_string()),
        }]),
    );

    // The sidecar keeps a persistent WebSocket to WhatsApp servers and the
    // session store inside the container, so it restarts on failure rather
    // than losing the pairing. It binds to localhost only.
    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        restart_policy: Some(RestartPolicy {
            name: Some(RestartPolicyNameEnum::ON_FAILURE),
            maximum_retry_count: Some(5),
        }),
        memory: Some(MEMORY_LIMIT_BYTES),
        ..Default::default()
    };

    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(port_key, HashMap::new());

    let container_config = ContainerConfig {
        image: Some(image.to_owned()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(host_config),
        ..Default::default()
    };

    let create_opts = CreateContainerOptions {
        name: CONTAINER_NAME.to_owned(),
        platform: None,
    };
    docker
        .create_container(Some(create_opts), container_config)
        .await
        .map_err(|e| BridgeError::SetupFailed(format!("failed to create container: {e}")))?;

    start_container(docker).await
}

/// Decode a base64 PNG payload and save it to `path`.
///
/// # Errors
///
/// Returns [`BridgeError::SetupFailed`] on decode or write failure.
pub async fn save_qr_png(data_b64: &str, path: &Path) -> Result<(), BridgeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data_b64.trim())
        .map_err(|e| BridgeError::SetupFailed(format!("invalid QR payload: {e}")))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| BridgeError::SetupFailed(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), "QR code saved");
    Ok(())
}

/// Upload the saved QR code PNG to the file host and return its public URL.
///
/// # Errors
///
/// Returns [`BridgeError::SetupFailed`] when the upload fails or the host
/// returns no location.
pub async fn upload_qr(upload_url: &str, path: &Path) -> Result<String, BridgeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BridgeError::SetupFailed(format!("failed to read {}: {e}", path.display())))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("qr.png")
        .to_owned();

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/png")
        .map_err(|e| BridgeError::SetupFailed(format!("invalid mime type: {e}")))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = reqwest::Client::new()
        .post(upload_url)
        .multipart(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        return Err(BridgeError::SetupFailed(format!(
            "QR upload returned {status}"
        )));
    }

    let body: serde_json::Value = resp.json().await?;
    body.get("location")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| BridgeError::SetupFailed("QR upload response had no location".to_owned()))
}

/// Handle a freshly issued QR code: save it locally, then best-effort
/// publish it to the file host and log the public URL.
pub async fn publish_qr(data_b64: &str, qr_path: &Path, upload_url: &str) {
    if let Err(e) = save_qr_png(data_b64, qr_path).await {
        warn!(error = %e, "failed to save QR code");
        return;
    }
    match upload_qr(upload_url, qr_path).await {
        Ok(url) => info!(%url, "QR code published"),
        Err(e) => warn!(error = %e, "failed to upload QR code"),
    }
}

/// Run the full pairing flow: ensure the container, wait for the sidecar,
/// fetch the QR code, and publish it.
///
/// # Errors
///
/// Returns [`BridgeError`] when the sidecar cannot be reached or offers no
/// QR code.
pub async fn link(
    docker: Option<&Docker>,
    client: &BridgeClient,
    image: &str,
    qr_path: &Path,
    upload_url: &str,
) -> Result<(), BridgeError> {
    if let Some(docker) = docker {
        ensure_container(docker, image).await?;
    }
    client.wait_reachable().await?;

    if client.is_ready().await {
        info!("WhatsApp session already linked, nothing to do");
        return Ok(());
    }

    let qr = client.get_qr().await?;
    save_qr_png(&qr, qr_path).await?;
    match upload_qr(upload_url, qr_path).await {
        Ok(url) => info!(%url, "scan this QR code to link WhatsApp"),
        Err(e) => warn!(error = %e, path = %qr_path.display(), "upload failed, scan the local file"),
    }
    Ok(())
}
