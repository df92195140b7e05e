//! HTTP client for the WhatsApp bridge sidecar.
//!
//! Every WhatsApp operation the responder performs goes through this client.
//! The sidecar wraps the browser-driven WhatsApp Web session and exposes a
//! small JSON API on localhost.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::responder::OutboundSender;
use crate::whatsapp::BridgeError;

/// HTTP connect timeout for the reqwest client.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP request timeout for normal operations.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Number of readiness retries before giving up.
const WAIT_READY_RETRIES: u32 = 10;

/// Delay between readiness attempts in milliseconds.
const WAIT_READY_DELAY_MS: u64 = 3000;

/// Client for the WhatsApp bridge HTTP API.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: String,
}

/// Connection status reported by the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Whether the WhatsApp Web session is linked and online.
    pub connected: bool,
    /// The linked phone number, when connected.
    #[serde(default)]
    pub me: Option<String>,
}

/// Response envelope from the bridge HTTP API.
#[derive(Deserialize)]
struct BridgeResponse<T> {
    #[allow(dead_code)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl BridgeClient {
    /// Create a new client pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeouts, using default");
                reqwest::Client::default()
            });
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Get the current connection status from the sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SidecarUnreachable`] when the sidecar answers
    /// without a status payload, or an HTTP error on transport failure.
    pub async fn status(&self) -> Result<BridgeStatus, BridgeError> {
        let url = format!("{}/status", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let body: BridgeResponse<BridgeStatus> = resp.json().await?;
        body.data.ok_or(BridgeError::SidecarUnreachable)
    }

    /// Whether the sidecar is reachable and the session is linked.
    pub async fn is_ready(&self) -> bool {
        match self.status().await {
            Ok(status) => status.connected,
            Err(_) => false,
        }
    }

    /// Wait for the sidecar to report a linked session, retrying with a
    /// fixed delay.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] when the retries are exhausted.
    pub async fn wait_ready(&self) -> Result<(), BridgeError> {
        for attempt in 0..WAIT_READY_RETRIES {
            if self.is_ready().await {
                return Ok(());
            }
            debug!(attempt, "bridge not ready yet");
            if attempt < WAIT_READY_RETRIES.saturating_sub(1) {
                tokio::time::sleep(std::time::Duration::from_millis(WAIT_READY_DELAY_MS)).await;
            }
        }
        Err(BridgeError::NotConnected)
    }

    /// Wait for the sidecar HTTP API to answer at all (linked or not),
    /// retrying with a fixed delay.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SidecarUnreachable`] when the retries are
    /// exhausted.
    pub async fn wait_reachable(&self) -> Result<(), BridgeError> {
        for attempt in 0..WAIT_READY_RETRIES {
            if self.status().await.is_ok() {
                return Ok(());
            }
            debug!(attempt, "bridge sidecar not reachable yet");
            if attempt < WAIT_READY_RETRIES.saturating_sub(1) {
                tokio::time::sleep(std::time::Duration::from_millis(WAIT_READY_DELAY_MS)).await;
            }
        }
        Err(BridgeError::SidecarUnreachable)
    }

    /// Get the pairing QR code as a base64-encoded PNG.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SetupFailed`] when the sidecar has no QR code
    /// to offer (already linked, or still starting up).
    pub async fn get_qr(&self) -> Result<String, BridgeError> {
        let url = format!("{}/qr", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let body: BridgeResponse<String> = resp.json().await?;
        body.data.ok_or_else(|| {
            BridgeError::SetupFailed(
                body.error
                    .unwrap_or_else(|| "no QR code available".to_owned()),
            )
        })
    }

    /// Send a text message to the given address.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SendRejected`] when the sidecar refuses the
    /// send, or an HTTP error on transport failure.
    pub async fn send_text(&self, to: &str, text: &str) -> Result<(), BridgeError> {
        let url = format!("{}/send", self.base_url);
        let body = serde_json::json!({ "to": to, "text": text });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            warn!(%status, to, "WhatsApp send failed");
            return Err(BridgeError::SendRejected(format!("{status}: {body_text}")));
        }
        debug!(to, "message sent via WhatsApp");
        Ok(())
    }

    /// Returns the base URL of the sidecar.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl OutboundSender for BridgeClient {
    async fn send_message(&self, to: &str, text: &str) -> Result<(), BridgeError> {
        self.send_text(to, text).await
    }
}
