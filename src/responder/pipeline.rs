//! The per-message handler: normalize, classify, forward or reply.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::ResponderConfig;
use crate::providers::{ChatMessage, ChatRequest, LlmProvider};
use crate::whatsapp::InboundMessage;

use super::{classifier, jid, persona, OutboundSender, ResponderError};

/// Body substituted for empty or whitespace-only messages.
pub const EMPTY_BODY_FALLBACK: &str = "hi";

/// Body substituted when the message carries media. The media itself is
/// discarded unseen.
pub const MEDIA_FALLBACK: &str = "[media attachment - cannot be processed]";

/// Substituted for a failed LLM call. Must never contain "yes": a failed
/// importance check falls through to the persona reply, not the owner.
pub const UNAVAILABLE_REPLY: &str = "I'm currently unavailable. Please try again later.";

/// Substituted when the model returns an empty completion (e.g. a reply
/// that was nothing but reasoning markup).
pub const EMPTY_COMPLETION_REPLY: &str =
    "I apologize, but I'm having trouble processing your request.";

/// Sent to the original sender when the handler itself fails.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again later.";

/// The message triage and response pipeline.
///
/// One instance serves every inbound message. Holds no per-message state;
/// decisions are recomputed each time.
pub struct MessageResponder {
    provider: Arc<dyn LlmProvider>,
    outbound: Arc<dyn OutboundSender>,
    config: ResponderConfig,
    triage_temperature: f32,
    reply_temperature: f32,
}

impl MessageResponder {
    /// Create a new responder.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        outbound: Arc<dyn OutboundSender>,
        config: ResponderConfig,
        triage_temperature: f32,
        reply_temperature: f32,
    ) -> Self {
        Self {
            provider,
            outbound,
            config,
            triage_temperature,
            reply_temperature,
        }
    }

    /// Handle one inbound message event to completion.
    ///
    /// Never fails: any error inside the flow is logged and answered with
    /// the fixed apology message (itself best-effort).
    pub async fn handle(&self, msg: &InboundMessage) {
        // Our own outbound messages echo back through the event stream;
        // answering them would loop forever.
        if msg.from_me {
            debug!(from = %msg.from, "ignoring self-originated message");
            return;
        }

        if !jid::is_direct_chat(&msg.from) {
            debug!(from = %msg.from, "ignoring non-direct message");
            return;
        }

        info!(from = %msg.from, body = %msg.body, "new message");

        if let Err(e) = self.respond(msg).await {
            error!(from = %msg.from, error = %e, "error processing message");
            if let Err(send_err) = self.outbound.send_message(&msg.from, APOLOGY_REPLY).await {
                warn!(from = %msg.from, error = %send_err, "failed to deliver apology");
            }
        }
    }

    /// The fallible part of the flow, caught by [`Self::handle`].
    async fn respond(&self, msg: &InboundMessage) -> Result<(), ResponderError> {
        if msg.has_media {
            info!(from = %msg.from, "message contains media, substituting fallback body");
        }
        let body = normalize_body(&msg.body, msg.has_media);

        let system_prompt = self.system_prompt();
        let verdict = self
            .ask(
                classifier::triage_system_prompt(&system_prompt, &self.config.owner_name),
                classifier::triage_user_prompt(&self.config.owner_name, &body),
                self.triage_temperature,
            )
            .await;

        if classifier::is_important(&verdict) {
            info!(from = %msg.from, "message marked important, forwarding to owner");
            let sender = jid::format_phone_number(&msg.from);
            self.outbound
                .send_message(&self.config.owner_jid, &forward_notice(&sender, &body))
                .await?;
            self.outbound
                .send_message(&msg.from, &forward_ack(&self.config.owner_name, &body))
                .await?;
        } else {
            let reply = self.ask(system_prompt, body, self.reply_temperature).await;
            info!(from = %msg.from, reply = %reply, "persona reply generated");
            self.outbound
                .send_message(
                    &msg.from,
                    &format!("*{}:* {reply}", self.config.persona_name),
                )
                .await?;
        }

        Ok(())
    }

    /// The persona system prompt: configured override, or the built-in one.
    fn system_prompt(&self) -> String {
        self.config.persona_prompt.clone().unwrap_or_else(|| {
            persona::default_persona_prompt(&self.config.persona_name, &self.config.owner_name)
        })
    }

    /// One LLM call that cannot fail.
    ///
    /// Provider errors become the fixed unavailability string; empty
    /// completions become the trouble string. Output is sanitized for
    /// delivery either way.
    async fn ask(&self, system: String, user: String, temperature: f32) -> String {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_temperature(temperature);

        match self.provider.complete(request).await {
            Ok(resp) => {
                let text = persona::sanitize_reply(&resp.content);
                if text.is_empty() {
                    EMPTY_COMPLETION_REPLY.to_owned()
                } else {
                    text
                }
            }
            Err(e) => {
                warn!(model = %self.provider.model_id(), error = %e, "LLM call failed");
                UNAVAILABLE_REPLY.to_owned()
            }
        }
    }
}

/// Normalize a message body for the pipeline.
///
/// Media wins over text: a captioned photo still becomes the media
/// fallback. An empty or whitespace-only body becomes the greeting token.
pub fn normalize_body(body: &str, has_media: bool) -> String {
    if has_media {
        return MEDIA_FALLBACK.to_owned();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        EMPTY_BODY_FALLBACK.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Notification text sent to the owner for an important message.
fn forward_notice(sender: &str, body: &str) -> String {
    format!("🚨 *Important message from {sender}*:\n\nMessage: {body}")
}

/// Acknowledgment text sent back to the original sender.
fn forward_ack(owner: &str, body: &str) -> String {
    format!(
        "✅ Your message:\n\n{body}\n\nThe above message has been forwarded to {owner}. \
         They may get back to you soon."
    )
}
