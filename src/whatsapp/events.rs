//! Event listener for the WhatsApp bridge.
//!
//! Long-polls the sidecar's `/events/poll` endpoint and forwards events to
//! the main loop through an mpsc channel. The sidecar emits `qr` while the
//! session is unpaired, `ready` once linked, and `message` for every
//! message in the account's chats (including our own sends, flagged with
//! `fromMe`).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// An inbound WhatsApp message as reported by the bridge.
///
/// Field names follow the bridge's camelCase JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Sender address (e.g. `917099073276@c.us`, or a `@g.us` group).
    pub from: String,
    /// Message text. Empty for media-only messages.
    #[serde(default)]
    pub body: String,
    /// Whether the message carries non-text media.
    #[serde(default)]
    pub has_media: bool,
    /// Whether this message was sent by our own account.
    #[serde(default)]
    pub from_me: bool,
}

/// An event from the bridge sidecar.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BridgeEvent {
    /// A pairing QR code is available (raw base64 PNG payload).
    Qr {
        /// Base64-encoded PNG image of the QR code.
        data: String,
    },
    /// The WhatsApp Web session is linked and online.
    Ready,
    /// A message was received (or sent by us).
    Message(InboundMessage),
    /// The session dropped.
    Disconnected {
        /// Human-readable reason, if available.
        reason: Option<String>,
    },
}

/// Long-poll timeout for the HTTP client (seconds).
const POLL_TIMEOUT_SECS: u64 = 60;

/// Initial reconnect backoff (milliseconds).
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum reconnect backoff (milliseconds).
const MAX_BACKOFF_MS: u64 = 30_000;

/// Spawn an event listener that forwards bridge events to the given channel.
///
/// Returns immediately. The listener runs as a background Tokio task and
/// reconnects automatically on failure with capped exponential backoff;
/// the backoff resets after any successful poll.
pub fn spawn_event_listener(
    base_url: String,
    event_tx: mpsc::Sender<BridgeEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let poll_url = format!("{base_url}/events/poll");
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            info!(url = %poll_url, "connecting to WhatsApp event stream");

            match poll_events(&poll_url, &event_tx).await {
                Ok(()) => {
                    info!("WhatsApp event stream closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, backoff_ms, "event stream error, reconnecting");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
                }
            }
        }
    })
}

/// Poll the sidecar for events until the receiver drops or a non-timeout
/// network error occurs. Returns `Err` so the caller can reconnect.
async fn poll_events(
    poll_url: &str,
    event_tx: &mpsc::Sender<BridgeEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(POLL_TIMEOUT_SECS))
        .build()?;

    loop {
        match client.get(poll_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<Vec<BridgeEvent>>().await {
                    Ok(events) => {
                        for event in events {
                            debug!(?event, "received bridge event");
                            if event_tx.send(event).await.is_err() {
                                // Receiver dropped -- shut down cleanly.
                                return Ok(());
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "unparseable event batch, skipping");
                    }
                }
            }
            Ok(resp) => {
                debug!(status = %resp.status(), "event poll returned non-200");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            Err(e) if e.is_timeout() => {
                // Normal: long-poll window expired, retry immediately.
                continue;
            }
            Err(e) => {
                return Err(e.into());
            }
        }
    }
}
