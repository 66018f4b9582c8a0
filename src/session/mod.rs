//! Session controller
//!
//! This module owns the lifecycle of a live voice session:
//! - microphone capture acquisition and release
//! - the remote live connection
//! - the connected/muted/speaking state machine presented to the UI layer
//!
//! The controller serializes the two asynchronous resources (capture first,
//! then connection), guarantees cleanup on every exit path, and guards
//! against late-arriving async completions with a session epoch.

mod controller;
mod state;

pub use controller::SessionController;
pub use state::{ConnectionStatus, SessionEvent, SessionState};
