//! Telemetry export
//!
//! Serializes a snapshot of the session configuration and conversation
//! history into a downloadable JSON artifact. Best-effort local I/O:
//! no retry, no queueing.

mod export;
mod record;

pub use export::{export, ArtifactSink, DirectorySink};
pub use record::{ExportedTurn, SessionConfiguration, TelemetryRecord};
