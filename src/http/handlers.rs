use super::state::AppState;
use crate::session::{ConnectionStatus, SessionEvent, SessionState};
use crate::telemetry;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: String,
    pub state: SessionState,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub filename: String,
    pub turns: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/start
/// Acquire the microphone and connect the live session
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    let mut events = state.controller.subscribe();

    let session = state.controller.start().await;

    if session.status == ConnectionStatus::Connected {
        info!("Session started via HTTP");
        return (
            StatusCode::OK,
            Json(SessionResponse {
                status: "connected".to_string(),
                state: session,
            }),
        )
            .into_response();
    }

    // Distinguish a permission denial from a generic failure so the UI can
    // show the dedicated prompt.
    while let Ok(event) = events.try_recv() {
        if event == SessionEvent::PermissionDenied {
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "microphone permission denied".to_string(),
                }),
            )
                .into_response();
        }
    }

    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "failed to start session".to_string(),
        }),
    )
        .into_response()
}

/// POST /session/stop
/// Tear down the live session and release the microphone
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.controller.stop().await;

    info!("Session stopped via HTTP");

    (
        StatusCode::OK,
        Json(SessionResponse {
            status: "disconnected".to_string(),
            state: session,
        }),
    )
}

/// POST /session/mic/toggle
/// Flip the microphone mute state of a connected session
pub async fn toggle_mic(State(state): State<AppState>) -> impl IntoResponse {
    let before = state.controller.state().await;
    if before.status != ConnectionStatus::Connected {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "session not connected".to_string(),
            }),
        )
            .into_response();
    }

    let session = state.controller.toggle_mic().await;

    (
        StatusCode::OK,
        Json(SessionResponse {
            status: if session.mic_muted { "muted" } else { "unmuted" }.to_string(),
            state: session,
        }),
    )
        .into_response()
}

/// GET /session/state
/// Current state snapshot for the UI
pub async fn get_session_state(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.state().await))
}

/// POST /session/reset
/// Clear accumulated conversation turns; the active connection is untouched
pub async fn reset_conversation(State(state): State<AppState>) -> impl IntoResponse {
    state.log.clear();

    info!("Conversation log reset");

    (
        StatusCode::OK,
        Json(SessionResponse {
            status: "reset".to_string(),
            state: state.controller.state().await,
        }),
    )
}

/// POST /telemetry/export
/// Snapshot the conversation and write a telemetry artifact
pub async fn export_telemetry(State(state): State<AppState>) -> impl IntoResponse {
    let turns = state.log.snapshot();

    match telemetry::export(
        state.configuration.clone(),
        state.tools.clone(),
        &turns,
        state.sink.as_ref(),
    ) {
        Ok(filename) => (
            StatusCode::OK,
            Json(ExportResponse {
                filename,
                turns: turns.len(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Telemetry export failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Export failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
