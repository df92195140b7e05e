//! Importance classification: prompt construction and verdict parsing.
//!
//! The model is asked a battery of yes/no questions about the message and
//! instructed to answer with a single word. Parsing is containment-based and
//! deliberately forgiving: reasoning models pad their answers, and a refusal
//! or an error placeholder must still produce a usable verdict.

/// Render the yes/no question battery for the importance check.
fn importance_questions(owner: &str) -> String {
    format!(
        "Is this message important and does it require {owner}'s attention? \
         Is it relevant to {owner}? Is it a threat or danger to {owner} or to \
         {owner}'s family or friends? Is it related to academics, a job, work, \
         or business? Is it related to money? Is it related to {owner}'s \
         family, friends, or life? Does it ask to forward the message to \
         {owner}? Reply with only 'yes' or 'no', nothing else. ONLY reply \
         with 'yes' or 'no'."
    )
}

/// System prompt for the importance check: the persona, then the question
/// battery.
pub fn triage_system_prompt(persona_prompt: &str, owner: &str) -> String {
    format!("{persona_prompt} {}", importance_questions(owner))
}

/// User prompt for the importance check: the question battery again, then
/// the message under scrutiny.
pub fn triage_user_prompt(owner: &str, body: &str) -> String {
    format!(
        "{} The message is: \"{body}\"",
        importance_questions(owner)
    )
}

/// Interpret a classification reply.
///
/// Any reply containing "yes" (case-insensitive, anywhere) is important.
/// Everything else — "no", empty output, refusals, the unavailability
/// placeholder — is not, which routes the message to the persona reply
/// instead of the owner.
pub fn is_important(reply: &str) -> bool {
    reply.to_lowercase().contains("yes")
}
