pub mod capture;
pub mod config;
pub mod http;
pub mod live;
pub mod log;
pub mod session;
pub mod telemetry;

pub use capture::{AudioChunk, CaptureDevice, CaptureError, CaptureEvent, WavCaptureDevice};
pub use config::Config;
pub use http::{create_router, AppState};
pub use live::{LiveClient, NatsLiveClient, RealtimeInputMessage, ServerTurnMessage};
pub use log::{ConversationLog, ConversationTurn, TurnRole};
pub use session::{ConnectionStatus, SessionController, SessionEvent, SessionState};
pub use telemetry::{ArtifactSink, DirectorySink, SessionConfiguration, TelemetryRecord};
