//! Message triage and response pipeline.
//!
//! One handler per inbound message: discard group and self-originated
//! traffic, normalize the body, ask the model whether the message needs the
//! owner's attention, then either forward it to the owner or answer it in
//! persona. No conversation state is kept between messages.

pub mod classifier;
pub mod jid;
pub mod persona;
pub mod pipeline;

pub use pipeline::MessageResponder;

use async_trait::async_trait;

use crate::whatsapp::BridgeError;

/// Outbound message transport as the responder sees it.
///
/// [`crate::whatsapp::BridgeClient`] is the production implementation; tests
/// substitute a recording mock.
#[async_trait]
pub trait OutboundSender: Send + Sync {
    /// Send a text message to the given address.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] when the transport rejects or fails the send.
    async fn send_message(&self, to: &str, text: &str) -> Result<(), BridgeError>;
}

/// Errors from the responder pipeline.
///
/// LLM failures never surface here: both call sites degrade to fixed
/// replacement strings. What remains is outbound transport failure.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    /// An outbound send failed.
    #[error("outbound send failed: {0}")]
    Send(#[from] BridgeError),
}
