//! MARVIN CLI entry point.
//!
//! Provides `start` and `link` subcommands: run the auto-responder event
//! loop, or run the QR pairing flow for a fresh WhatsApp session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bollard::Docker;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use marvin::config::MarvinConfig;
use marvin::providers::{groq::GroqProvider, LlmProvider};
use marvin::responder::{MessageResponder, OutboundSender};
use marvin::whatsapp::{setup, spawn_event_listener, BridgeClient, BridgeEvent};

/// Capacity of the bridge event channel. Events queue here while a message
/// handler is running; there is no further backpressure by design.
const EVENT_BUFFER_SIZE: usize = 64;

/// MARVIN — personal WhatsApp auto-responder.
#[derive(Parser)]
#[command(name = "marvin", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the auto-responder.
    Start,
    /// Pair a WhatsApp session: fetch, save, and publish the QR code.
    Link,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials commonly live in .env, as the deployment docs describe.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Start => handle_start().await,
        Command::Link => handle_link().await,
    }
}

/// Run the auto-responder event loop.
async fn handle_start() -> anyhow::Result<()> {
    let config = MarvinConfig::load().context("failed to load configuration")?;
    config.validate()?;
    // Missing credentials are fatal before anything connects.
    let api_key = config.llm.require_api_key()?.to_owned();

    let _logging_guard =
        marvin::logging::init_daemon(Path::new(&config.log.dir), &config.log.level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "MARVIN starting");

    let provider: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(
        config.llm.base_url.clone(),
        api_key,
        config.llm.model.clone(),
    ));
    info!(model = %provider.model_id(), "LLM provider ready");

    if config.bridge.manage_sidecar {
        let docker =
            Docker::connect_with_local_defaults().context("failed to connect to Docker")?;
        setup::ensure_container(&docker, &config.bridge.sidecar_image).await?;
    }

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    let _listener = spawn_event_listener(config.bridge.base_url.clone(), event_tx);

    let outbound: Arc<dyn OutboundSender> =
        Arc::new(BridgeClient::new(config.bridge.base_url.clone()));
    let responder = MessageResponder::new(
        provider,
        outbound,
        config.responder.clone(),
        config.llm.triage_temperature,
        config.llm.reply_temperature,
    );

    info!("listening for messages");

    // One handler at a time: each message runs to completion (including its
    // network calls) before the next event is taken from the channel.
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    info!("event stream ended");
                    break;
                };
                match event {
                    BridgeEvent::Message(msg) => responder.handle(&msg).await,
                    BridgeEvent::Qr { data } => {
                        setup::publish_qr(
                            &data,
                            Path::new(&config.bridge.qr_path),
                            &config.bridge.qr_upload_url,
                        )
                        .await;
                    }
                    BridgeEvent::Ready => {
                        info!("assistant is active and managing messages");
                    }
                    BridgeEvent::Disconnected { reason } => {
                        warn!(
                            reason = reason.as_deref().unwrap_or("unknown"),
                            "WhatsApp session disconnected"
                        );
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
        }
    }

    info!("MARVIN shut down cleanly");
    Ok(())
}

/// Run the QR pairing flow and exit.
async fn handle_link() -> anyhow::Result<()> {
    marvin::logging::init_cli();

    let config = MarvinConfig::load().context("failed to load configuration")?;
    config.validate()?;

    let bridge = BridgeClient::new(config.bridge.base_url.clone());
    let docker = if config.bridge.manage_sidecar {
        Some(Docker::connect_with_local_defaults().context("failed to connect to Docker")?)
    } else {
        None
    };

    setup::link(
        docker.as_ref(),
        &bridge,
        &config.bridge.sidecar_image,
        Path::new(&config.bridge.qr_path),
        &config.bridge.qr_upload_url,
    )
    .await?;

    Ok(())
}
