use crate::capture::AudioChunk;
use anyhow::Result;

/// Remote live-session client contract
///
/// The controller guarantees its own connect/disconnect calls are paired
/// and non-overlapping, but the client may be shared with other consumers
/// and must tolerate repeated disconnects.
#[async_trait::async_trait]
pub trait LiveClient: Send + Sync {
    /// Establish the remote session.
    async fn connect(&self) -> Result<()>;

    /// Tear down the remote session. No-op when not connected.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the session is currently established
    fn is_connected(&self) -> bool;

    /// Push one or more audio chunks to the active session.
    ///
    /// Fire-and-forget: callers must not invoke this while disconnected,
    /// and implementations treat that case as a no-op rather than an error.
    async fn send_realtime_input(&self, chunks: Vec<AudioChunk>) -> Result<()>;
}
