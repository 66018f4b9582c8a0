//! HTTP control surface
//!
//! The presentation layer drives the session over a small REST API:
//! - POST /session/start - acquire the mic and connect
//! - POST /session/stop - tear the session down
//! - POST /session/mic/toggle - mute/unmute
//! - GET  /session/state - current state snapshot
//! - POST /session/reset - clear the conversation log
//! - POST /telemetry/export - write a telemetry artifact
//! - GET  /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
