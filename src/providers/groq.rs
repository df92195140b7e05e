//! Groq provider implementation using the OpenAI-compatible
//! `/chat/completions` API.

use serde::{Deserialize, Serialize};

use super::{check_http_response, ChatRequest, ChatResponse, LlmProvider, ProviderError, Role, UsageStats};

const DEFAULT_MAX_TOKENS: u32 = 2048;

/// HTTP request timeout. Covers the slowest realistic completion; the
/// responder has no retry layer above this.
const REQUEST_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Groq chat completions API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GroqRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<GroqMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A message in OpenAI chat format.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GroqMessage {
    /// Role (`system`, `user`, `assistant`).
    pub role: String,
    /// Text content.
    pub content: String,
}

/// Groq chat completions API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GroqResponse {
    /// Response choices.
    pub choices: Vec<GroqChoice>,
    /// Model that served the response.
    pub model: Option<String>,
    /// Token usage.
    pub usage: Option<GroqUsage>,
}

/// A response choice from the API.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GroqChoice {
    /// Assistant message for this choice.
    pub message: GroqResponseMessage,
}

/// Assistant message payload.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GroqResponseMessage {
    /// Optional text content.
    pub content: Option<String>,
}

/// Token usage statistics.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GroqUsage {
    /// Prompt token count.
    pub prompt_tokens: Option<u32>,
    /// Completion token count.
    pub completion_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Groq chat completions API provider.
#[derive(Debug, Clone)]
pub struct GroqProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqProvider {
    /// Create a new Groq provider instance.
    ///
    /// `base_url` is the API root up to and including the OpenAI-compatible
    /// prefix, e.g. `https://api.groq.com/openai/v1`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client with timeout, using default");
                reqwest::Client::default()
            });
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Groq API request from a chat request.
#[doc(hidden)]
pub fn build_request(model: &str, request: &ChatRequest) -> GroqRequest {
    let messages = request
        .messages
        .iter()
        .map(|m| GroqMessage {
            role: role_name(m.role).to_owned(),
            content: m.content.clone(),
        })
        .collect();

    GroqRequest {
        model: model.to_owned(),
        messages,
        temperature: request.temperature,
        max_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    }
}

/// Parse a Groq API response body into a chat response.
///
/// A missing or null `content` becomes an empty string; the caller decides
/// what an empty completion means.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or
/// contains no choices.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<ChatResponse, ProviderError> {
    let resp: GroqResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("missing choices[0]".to_owned()))?;

    let usage = UsageStats {
        input_tokens: resp
            .usage
            .as_ref()
            .and_then(|u| u.prompt_tokens)
            .unwrap_or(0),
        output_tokens: resp
            .usage
            .as_ref()
            .and_then(|u| u.completion_tokens)
            .unwrap_or(0),
    };

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        model: resp.model.unwrap_or_default(),
        usage,
    })
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let api_request = build_request(&self.model, &request);

        let response = self
            .client
            .post(self.completions_url())
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
