mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::ParleyConfig;
use parley_channels::{LiveChannel, ScriptedChannel, WebSocketChannel};
use parley_core::SessionId;
use parley_extract::ExtractionPipeline;
use parley_gateway::{StagingServer, StagingStore};
use parley_remote::{HttpSessionRegistry, HttpStagingClient, RemoteClient, SessionRegistry};
use parley_session::{ControllerEvent, MicrophoneAccess, SessionController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley", about = "Parley: voice sessions that collect a user profile")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "parley.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local staging endpoint
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Hold a live conversation over the relay
    Converse {
        /// Behave as if microphone access was refused
        #[arg(long)]
        no_mic: bool,
    },
    /// Replay a recorded event list as a whole session
    Replay {
        /// JSON Lines file, one inbound event per line
        events: PathBuf,
    },
    /// Fetch a stored profile from the workflow backend
    Fetch {
        /// Session id to look up; the latest record otherwise
        #[arg(long)]
        session: Option<String>,
    },
}

struct Remotes {
    registry: Arc<HttpSessionRegistry>,
    pipeline: Arc<ExtractionPipeline>,
}

fn build_remotes(config: &ParleyConfig) -> anyhow::Result<Remotes> {
    let client = RemoteClient::new(Duration::from_secs(config.remote.request_timeout_secs))?;
    let registry = Arc::new(HttpSessionRegistry::new(client.clone(), &config.remote));
    let staging = Arc::new(HttpStagingClient::new(client, config.remote.staging_url.clone()));
    let pipeline = Arc::new(ExtractionPipeline::new(
        staging,
        registry.clone(),
        config.extraction.clone(),
    ));
    Ok(Remotes { registry, pipeline })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ParleyConfig::load(&cli.config).await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            info!("Starting Parley staging endpoint on {}", server.bind_addr());
            StagingServer::serve(&server, Arc::new(StagingStore::new())).await?;
        }
        Commands::Converse { no_mic } => {
            if config.agent_id.is_empty() {
                anyhow::bail!("agent_id is not configured (set it in the config file or PARLEY_AGENT_ID)");
            }
            let remotes = build_remotes(&config)?;
            let channel: Arc<dyn LiveChannel> = Arc::new(WebSocketChannel::new(&config.channel.url));
            let mut controller = SessionController::new(
                config.agent_id.clone(),
                channel,
                remotes.registry,
                remotes.pipeline,
            );
            let microphone = if no_mic {
                MicrophoneAccess::Denied
            } else {
                MicrophoneAccess::Granted
            };
            converse(&mut controller, microphone).await?;
        }
        Commands::Replay { events } => {
            let text = tokio::fs::read_to_string(&events)
                .await
                .with_context(|| format!("Failed to read events file '{}'", events.display()))?;
            let channel = Arc::new(ScriptedChannel::from_jsonl(&text)?);
            let remotes = build_remotes(&config)?;
            let agent_id = if config.agent_id.is_empty() {
                "replay".to_string()
            } else {
                config.agent_id.clone()
            };
            let mut controller =
                SessionController::new(agent_id, channel, remotes.registry, remotes.pipeline);
            controller.start(MicrophoneAccess::Granted).await?;
            let outcome = controller.run_until_idle().await;
            print_json(&outcome)?;
        }
        Commands::Fetch { session } => {
            let remotes = build_remotes(&config)?;
            let result = match session {
                Some(id) => remotes.registry.fetch_by_session(&SessionId::from_raw(id)).await,
                None => remotes.registry.fetch_latest().await,
            };
            match result {
                Ok(envelope) => print_json(&envelope.data)?,
                Err(e) => anyhow::bail!("{}", e.user_facing()),
            }
        }
    }

    Ok(())
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Event(Option<ControllerEvent>),
}

/// Interactive session: stdin lines are commands or typed turns.
async fn converse(
    controller: &mut SessionController,
    microphone: MicrophoneAccess,
) -> anyhow::Result<()> {
    let id = controller.start(microphone).await?;
    eprintln!("Session {} started. /end to finish, /mute to toggle audio.", id.short_label());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    while !controller.is_idle() {
        let input = tokio::select! {
            line = lines.next_line(), if stdin_open => Input::Line(line),
            event = controller.next_event() => Input::Event(event),
        };
        match input {
            Input::Event(Some(event)) => controller.handle(event).await,
            Input::Event(None) => break,
            Input::Line(Ok(Some(line))) => match line.trim() {
                "/end" => controller.end().await?,
                "/mute" => match controller.toggle_mute().await {
                    Ok(muted) => eprintln!("{}", if muted { "Muted" } else { "Unmuted" }),
                    Err(e) => warn!(error = %e, "Mute toggle failed"),
                },
                "/dismiss" => controller.dismiss_error(),
                text => {
                    if let Err(e) = controller.send_text(text) {
                        warn!(error = %e, "Typed turn ignored");
                    }
                }
            },
            Input::Line(Ok(None)) => {
                stdin_open = false;
                controller.end().await?;
            }
            Input::Line(Err(e)) => {
                warn!(error = %e, "Failed to read stdin");
                stdin_open = false;
            }
        }
        if let Some(message) = controller.error_message().map(str::to_string) {
            eprintln!("Error: {message}");
            controller.dismiss_error();
        }
    }

    print_json(&controller.outcome())
}
