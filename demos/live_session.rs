// Drives a full session lifecycle against a running NATS server:
// start (capture + connect), speak for a few seconds, toggle the mic,
// stop, then export the telemetry artifact.
//
// Usage: cargo run --example live_session -- <wav-file>

use anyhow::Result;
use eburon_console::telemetry::{self, DirectorySink, SessionConfiguration};
use eburon_console::{
    ConnectionStatus, ConversationLog, LiveClient, NatsLiveClient, SessionController,
    WavCaptureDevice,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let wav = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/sample-utterance.wav".to_string());

    let session_id = format!("demo-{}", chrono::Utc::now().timestamp());
    let live = Arc::new(NatsLiveClient::new("nats://localhost:4222", session_id));
    let capture = Box::new(WavCaptureDevice::new(&wav, 100));

    let controller = SessionController::new(capture, Arc::clone(&live) as Arc<dyn LiveClient>);
    let log = ConversationLog::new();

    info!("Starting session from {}", wav);
    let state = controller.start().await;
    anyhow::ensure!(
        state.status == ConnectionStatus::Connected,
        "session failed to start"
    );

    sleep(Duration::from_secs(3)).await;

    info!("Muting for one second");
    controller.toggle_mic().await;
    sleep(Duration::from_secs(1)).await;
    controller.toggle_mic().await;

    sleep(Duration::from_secs(3)).await;

    info!("Stopping session");
    controller.stop().await;

    let sink = DirectorySink::new("exports");
    let filename = telemetry::export(
        SessionConfiguration {
            model: "models/live-conversation-latest".into(),
            system_prompt: "You are a helpful and friendly AI assistant.".into(),
        },
        Vec::new(),
        &log.snapshot(),
        &sink,
    )?;

    info!("Telemetry exported to exports/{}", filename);

    Ok(())
}
