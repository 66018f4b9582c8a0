use serde::Serialize;

/// Connection phase of the live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// UI-facing session state
///
/// Invariants, enforced by the controller on every transition:
/// - `speaking` only while connected and unmuted
/// - leaving `Connected` forces the mic back to muted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub status: ConnectionStatus,
    pub mic_muted: bool,
    pub speaking: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        // Start muted for privacy and user control.
        Self {
            status: ConnectionStatus::Disconnected,
            mic_muted: true,
            speaking: false,
        }
    }
}

impl SessionState {
    /// Clamp the state back onto the invariant surface.
    pub(crate) fn normalize(&mut self) {
        if self.status == ConnectionStatus::Disconnected {
            self.mic_muted = true;
        }
        if self.status != ConnectionStatus::Connected || self.mic_muted {
            self.speaking = false;
        }
    }
}

/// Events broadcast to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session state changed; carries the new snapshot.
    StateChanged(SessionState),
    /// Microphone permission was denied; surface a user-facing prompt.
    /// Emitted at most once per start attempt, never retried internally.
    PermissionDenied,
}
