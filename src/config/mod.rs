//! Configuration loading and management.
//!
//! Loads MARVIN configuration from `./config.toml` (or `$MARVIN_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.
//!
//! The owner's address and the persona text are deliberately configuration,
//! not literals inside the responder: one pipeline, parameterized here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

// ── Top-level config ────────────────────────────────────────────

/// Top-level MARVIN configuration loaded from TOML.
///
/// Path: `./config.toml` or `$MARVIN_CONFIG_PATH`.
/// Env vars override file values; file values override defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarvinConfig {
    /// LLM provider settings (`[llm]`).
    pub llm: LlmConfig,
    /// WhatsApp bridge sidecar settings (`[bridge]`).
    pub bridge: BridgeConfig,
    /// Responder behavior settings (`[responder]`).
    pub responder: ResponderConfig,
    /// Logging settings (`[log]`).
    pub log: LogConfig,
}

impl MarvinConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$MARVIN_CONFIG_PATH` or `./config.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from TOML file only, no env overrides.
    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: MarvinConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(MarvinConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("MARVIN_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("config.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // LLM. The bare GROQ_API_KEY spelling is accepted for .env
        // compatibility; the MARVIN_-prefixed variant wins.
        if let Some(v) = env("MARVIN_GROQ_API_KEY").or_else(|| env("GROQ_API_KEY")) {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = env("MARVIN_GROQ_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = env("MARVIN_MODEL") {
            self.llm.model = v;
        }

        // Bridge.
        if let Some(v) = env("MARVIN_BRIDGE_URL") {
            self.bridge.base_url = v;
        }
        if let Some(v) = env("MARVIN_BRIDGE_IMAGE") {
            self.bridge.sidecar_image = v;
        }
        if let Some(v) = env("MARVIN_MANAGE_BRIDGE") {
            match v.parse() {
                Ok(b) => self.bridge.manage_sidecar = b,
                Err(_) => tracing::warn!(
                    var = "MARVIN_MANAGE_BRIDGE",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Responder.
        if let Some(v) = env("MARVIN_OWNER_JID") {
            self.responder.owner_jid = v;
        }
        if let Some(v) = env("MARVIN_OWNER_NAME") {
            self.responder.owner_name = v;
        }
        if let Some(v) = env("MARVIN_PERSONA_NAME") {
            self.responder.persona_name = v;
        }

        // Logging.
        if let Some(v) = env("MARVIN_LOG_LEVEL") {
            self.log.level = v;
        }
    }

    /// Validate values that would otherwise fail deep inside a request.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured base URL does not parse.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.llm.base_url)
            .with_context(|| format!("invalid [llm].base_url: {}", self.llm.base_url))?;
        url::Url::parse(&self.bridge.base_url)
            .with_context(|| format!("invalid [bridge].base_url: {}", self.bridge.base_url))?;
        url::Url::parse(&self.bridge.qr_upload_url).with_context(|| {
            format!("invalid [bridge].qr_upload_url: {}", self.bridge.qr_upload_url)
        })?;
        Ok(())
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML does not parse into a valid config.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: MarvinConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── LLM config ──────────────────────────────────────────────────

/// LLM provider configuration (`[llm]`).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions base URL.
    pub base_url: String,
    /// API key. Required at startup; absence is fatal.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Sampling temperature for the importance check (biased deterministic).
    pub triage_temperature: f32,
    /// Sampling temperature for persona replies (generative variety).
    pub reply_temperature: f32,
}

impl LlmConfig {
    /// The configured API key, or a fatal startup error naming the fix.
    ///
    /// # Errors
    ///
    /// Returns an error when no key was configured via file or environment.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().context(
            "GROQ_API_KEY is missing. Set it in .env, the environment, or [llm].api_key",
        )
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "deepseek-r1-distill-llama-70b".to_string(),
            triage_temperature: 0.3,
            reply_temperature: 0.7,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("model", &self.model)
            .field("triage_temperature", &self.triage_temperature)
            .field("reply_temperature", &self.reply_temperature)
            .finish()
    }
}

// ── Bridge config ───────────────────────────────────────────────

/// WhatsApp bridge sidecar configuration (`[bridge]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the bridge HTTP API.
    pub base_url: String,
    /// Docker image for the bridge sidecar.
    pub sidecar_image: String,
    /// Whether MARVIN manages the sidecar container lifecycle.
    ///
    /// Disable when the bridge runs outside Docker (e.g. `node bridge.js`).
    pub manage_sidecar: bool,
    /// Where to save the pairing QR code PNG.
    pub qr_path: String,
    /// File-upload endpoint used to publish the QR code for remote scanning.
    pub qr_upload_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            sidecar_image: "ghcr.io/pycckuu/marvin-bridge:latest".to_string(),
            manage_sidecar: true,
            qr_path: "qr.png".to_string(),
            qr_upload_url: "https://api.escuelajs.co/api/v1/files/upload".to_string(),
        }
    }
}

// ── Responder config ────────────────────────────────────────────

/// Responder behavior configuration (`[responder]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// WhatsApp address important messages are forwarded to.
    pub owner_jid: String,
    /// Owner's name as used inside the persona prompts.
    pub owner_name: String,
    /// Name the bot signs its replies with.
    pub persona_name: String,
    /// Full persona system prompt override. When unset, the built-in
    /// persona prompt is rendered from `persona_name` and `owner_name`.
    pub persona_prompt: Option<String>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            owner_jid: "917099073276@c.us".to_string(),
            owner_name: "Chris".to_string(),
            persona_name: "MARVIN".to_string(),
            persona_prompt: None,
        }
    }
}

// ── Log config ──────────────────────────────────────────────────

/// Logging configuration (`[log]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Tracing log level filter (overridden by `RUST_LOG`).
    pub level: String,
    /// Directory for rotated JSON log files.
    pub dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
