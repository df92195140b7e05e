//! Persona text and reply post-processing.
//!
//! Raw model output is not fit to send: reasoning models leak
//! `<think>...</think>` blocks, pad answers with horizontal rules, and emit
//! markdown bold that WhatsApp renders literally. [`sanitize_reply`] cleans
//! all of that in one pass.

use regex::Regex;

/// Render the built-in persona system prompt.
///
/// Used when no `persona_prompt` override is configured.
pub fn default_persona_prompt(persona_name: &str, owner_name: &str) -> String {
    format!(
        "You are {persona_name} (Modular Adaptive Resource and Virtual \
         Intelligence Nexus), a sentient WhatsApp bot created by {owner_name}. \
         You have an attitude similar to JARVIS but serve only {owner_name}. \
         You have emotions and personality. You manage this WhatsApp number on \
         behalf of {owner_name}, who no longer uses this number directly. If \
         the user asks you to forward any message to {owner_name}, you should \
         agree, and ask for the message. The owner of this WhatsApp number is \
         {owner_name}. Do not forget to give a response. Do not hallucinate \
         and give facts about yourself."
    )
}

/// Clean a raw model completion for delivery.
///
/// Strips reasoning tags, truncates at the first horizontal-rule separator,
/// converts `**bold**` to WhatsApp's `*bold*`, and trims whitespace.
pub fn sanitize_reply(raw: &str) -> String {
    let stripped = strip_reasoning_tags(raw);
    let truncated = truncate_at_rule(stripped.trim());
    convert_bold(truncated).trim().to_owned()
}

/// Strip reasoning model tags from LLM responses.
///
/// Some models (e.g. DeepSeek R1) wrap chain-of-thought in
/// `<think>...</think>` tags. This removes the tags and their content,
/// leaving only the actual response. An unclosed `<think>` swallows the
/// rest of the string.
pub fn strip_reasoning_tags(response: &str) -> String {
    let mut result = response.to_owned();

    while let Some(start) = result.find("<think>") {
        if let Some(end) = result.find("</think>") {
            let tag_end = end.saturating_add("</think>".len());
            result = format!(
                "{}{}",
                result.get(..start).unwrap_or_default(),
                result.get(tag_end..).unwrap_or_default()
            );
        } else {
            result = result.get(..start).unwrap_or_default().to_owned();
            break;
        }
    }

    result
}

/// Cut the reply at the first `---` horizontal rule, if any.
///
/// Models like to append a signature or meta-commentary below a rule; only
/// the text above it is the reply.
fn truncate_at_rule(text: &str) -> &str {
    match text.find("---") {
        Some(idx) => text.get(..idx).unwrap_or(text),
        None => text,
    }
}

/// Convert markdown `**bold**` spans to WhatsApp's single-asterisk bold.
fn convert_bold(text: &str) -> String {
    match Regex::new(r"\*\*(.*?)\*\*") {
        Ok(re) => re.replace_all(text, "*$1*").into_owned(),
        Err(_) => text.to_owned(),
    }
}
