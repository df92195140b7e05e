//! WhatsApp address (JID) helpers.

/// Suffix of direct (person-to-person) chat addresses. Group chats end in
/// `@g.us` and are never answered.
const DIRECT_CHAT_SUFFIX: &str = "@c.us";

/// Whether the address is a direct chat with an individual contact.
pub fn is_direct_chat(jid: &str) -> bool {
    jid.ends_with(DIRECT_CHAT_SUFFIX)
}

/// Render a direct-chat JID as a human-readable phone number.
///
/// `917099073276@c.us` becomes `+917099073276`. Anything that is not
/// `<digits>@c.us` is passed through unchanged, so the function is total
/// and idempotent.
pub fn format_phone_number(jid: &str) -> String {
    match jid.strip_suffix(DIRECT_CHAT_SUFFIX) {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            format!("+{digits}")
        }
        _ => jid.to_owned(),
    }
}
