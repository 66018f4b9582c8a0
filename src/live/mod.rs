//! Live session connection
//!
//! The controller talks to the remote conversational session through the
//! `LiveClient` contract: connect/disconnect plus a fire-and-forget push of
//! realtime audio input. `NatsLiveClient` is the NATS-backed implementation
//! used by the binary; the wire protocol beyond these messages belongs to
//! the remote side.

pub mod client;
pub mod messages;
pub mod nats;

pub use client::LiveClient;
pub use messages::{RealtimeInputMessage, ServerTurnMessage};
pub use nats::NatsLiveClient;
