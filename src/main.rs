use anyhow::{Context, Result};
use clap::Parser;
use eburon_console::{
    create_router, AppState, ConnectionStatus, Config, ConversationLog, ConversationTurn,
    DirectorySink, LiveClient, NatsLiveClient, ServerTurnMessage, SessionController, SessionEvent,
    TurnRole, WavCaptureDevice,
};
use eburon_console::telemetry::SessionConfiguration;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "eburon-console", about = "Voice session console service")]
struct Args {
    /// Config file path (extension optional, e.g. config/eburon-console)
    #[arg(long, default_value = "config/eburon-console")]
    config: String,

    /// WAV file used as the capture source (16 kHz mono)
    #[arg(long, default_value = "tests/fixtures/sample-utterance.wav")]
    wav: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Live transport: {}", cfg.live.url);
    info!("Capture source: {}", args.wav);

    let session_id = format!("console-{}", uuid::Uuid::new_v4());
    let live = Arc::new(NatsLiveClient::new(cfg.live.url.clone(), session_id.clone()));
    let capture = Box::new(WavCaptureDevice::new(&args.wav, cfg.audio.frame_duration_ms));

    let controller = SessionController::new(capture, Arc::clone(&live) as Arc<dyn LiveClient>);
    let log = ConversationLog::new();

    spawn_turn_collector(controller.clone(), Arc::clone(&live), log.clone());

    let state = AppState {
        controller,
        log,
        configuration: SessionConfiguration {
            model: cfg.live.model.clone(),
            system_prompt: cfg.live.system_prompt.clone(),
        },
        tools: Vec::new(),
        sink: Arc::new(DirectorySink::new(cfg.telemetry.export_dir.clone())),
    };

    let router = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    info!("HTTP control surface listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router).await?;

    Ok(())
}

/// Append agent turns from the live transport to the conversation log for
/// as long as a session is connected.
fn spawn_turn_collector(
    controller: SessionController,
    live: Arc<NatsLiveClient>,
    log: ConversationLog,
) {
    let mut events = controller.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::StateChanged(state))
                    if state.status == ConnectionStatus::Connected =>
                {
                    let mut subscriber = match live.subscribe_turns().await {
                        Ok(s) => s,
                        Err(e) => {
                            warn!("Failed to subscribe to turns: {:#}", e);
                            continue;
                        }
                    };

                    // The subscription ends when the session disconnects
                    // and the underlying client is dropped.
                    while let Some(msg) = subscriber.next().await {
                        match serde_json::from_slice::<ServerTurnMessage>(&msg.payload) {
                            Ok(turn) => {
                                let role = match turn.role.as_str() {
                                    "user" => TurnRole::User,
                                    "system" => TurnRole::System,
                                    _ => TurnRole::Agent,
                                };
                                log.push(ConversationTurn::new(role, turn.text));
                            }
                            Err(e) => warn!("Failed to parse turn message: {}", e),
                        }
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Turn collector lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
