// End-to-end tests for the HTTP control surface, driving the real session
// controller through the router with an in-memory live client and a
// WAV-backed capture device.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use eburon_console::telemetry::{ArtifactSink, SessionConfiguration};
use eburon_console::{
    create_router, AppState, AudioChunk, ConversationLog, ConversationTurn, LiveClient,
    SessionController, TurnRole, WavCaptureDevice,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Live client that connects instantly and discards input
#[derive(Default)]
struct InMemoryLive {
    connected: AtomicBool,
}

#[async_trait::async_trait]
impl LiveClient for InMemoryLive {
    async fn connect(&self) -> anyhow::Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_realtime_input(&self, _chunks: Vec<AudioChunk>) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct MemorySink {
    delivered: Mutex<Vec<String>>,
}

impl ArtifactSink for MemorySink {
    fn deliver(&self, filename: &str, _bytes: &[u8]) -> anyhow::Result<()> {
        self.delivered.lock().unwrap().push(filename.to_string());
        Ok(())
    }
}

fn write_fixture(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..16_000 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn test_state(wav_path: &Path) -> (AppState, ConversationLog) {
    let capture = Box::new(WavCaptureDevice::new(wav_path, 50));
    let live = Arc::new(InMemoryLive::default());
    let controller = SessionController::new(capture, live as Arc<dyn LiveClient>);
    let log = ConversationLog::new();

    let state = AppState {
        controller,
        log: log.clone(),
        configuration: SessionConfiguration {
            model: "models/live-conversation-latest".into(),
            system_prompt: "Be concise.".into(),
        },
        tools: Vec::new(),
        sink: Arc::new(MemorySink::default()),
    };

    (state, log)
}

async fn request(
    router: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

#[tokio::test]
async fn health_check_responds_ok() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("f.wav");
    write_fixture(&wav);

    let (state, _log) = test_state(&wav);
    let router = create_router(state);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("f.wav");
    write_fixture(&wav);

    let (state, _log) = test_state(&wav);
    let router = create_router(state);

    let (status, body) = request(&router, "GET", "/session/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disconnected");
    assert_eq!(body["mic_muted"], true);

    let (status, body) = request(&router, "POST", "/session/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["status"], "connected");
    assert_eq!(body["state"]["mic_muted"], false);

    let (status, body) = request(&router, "POST", "/session/mic/toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "muted");
    assert_eq!(body["state"]["mic_muted"], true);

    let (status, body) = request(&router, "POST", "/session/stop").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["status"], "disconnected");
    assert_eq!(body["state"]["mic_muted"], true);
}

#[tokio::test]
async fn mic_toggle_without_session_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("f.wav");
    write_fixture(&wav);

    let (state, _log) = test_state(&wav);
    let router = create_router(state);

    let (status, body) = request(&router, "POST", "/session/mic/toggle").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not connected"));
}

#[tokio::test]
async fn start_with_broken_device_fails_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    // Deliberately missing file: capture acquisition fails, connect is
    // never attempted, and the API reports an upstream failure.
    let (state, _log) = test_state(&dir.path().join("missing.wav"));
    let router = create_router(state);

    let (status, _body) = request(&router, "POST", "/session/start").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = request(&router, "GET", "/session/state").await;
    assert_eq!(body["status"], "disconnected");
}

#[tokio::test]
async fn reset_clears_the_conversation_log() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("f.wav");
    write_fixture(&wav);

    let (state, log) = test_state(&wav);
    let router = create_router(state);

    log.push(ConversationTurn::new(TurnRole::User, "hello"));
    log.push(ConversationTurn::new(TurnRole::Agent, "hi"));
    assert_eq!(log.len(), 2);

    let (status, body) = request(&router, "POST", "/session/reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reset");
    assert!(log.is_empty());
}

#[tokio::test]
async fn export_reports_filename_and_turn_count() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("f.wav");
    write_fixture(&wav);

    let (state, log) = test_state(&wav);
    let router = create_router(state);

    log.push(ConversationTurn::new(TurnRole::User, "one"));
    log.push(ConversationTurn::new(TurnRole::Agent, "two"));

    let (status, body) = request(&router, "POST", "/telemetry/export").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["turns"], 2);
    assert!(body["filename"]
        .as_str()
        .unwrap()
        .starts_with("eburon-telemetry-"));
}
