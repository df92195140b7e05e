//! WhatsApp transport: HTTP bridge client, event listener, and pairing setup.
//!
//! All WhatsApp connectivity (QR pairing, session persistence, delivery)
//! lives in a browser-automation sidecar wrapping the WhatsApp Web client.
//! This module talks to it over HTTP on localhost and long-polls for
//! real-time events.

pub mod client;
pub mod events;
pub mod setup;

pub use client::BridgeClient;
pub use events::{spawn_event_listener, BridgeEvent, InboundMessage};

/// Errors from the WhatsApp bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// HTTP request to the sidecar failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sidecar is not running or not reachable.
    #[error("bridge sidecar not reachable")]
    SidecarUnreachable,

    /// The sidecar is up but the WhatsApp session is not linked.
    #[error("not connected to WhatsApp (scan the QR code with `marvin link`)")]
    NotConnected,

    /// An outbound send was rejected by the sidecar.
    #[error("send rejected: {0}")]
    SendRejected(String),

    /// Container setup or pairing flow failed.
    #[error("setup failed: {0}")]
    SetupFailed(String),
}
