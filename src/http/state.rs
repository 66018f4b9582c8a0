use std::sync::Arc;

use crate::log::ConversationLog;
use crate::session::SessionController;
use crate::telemetry::{ArtifactSink, SessionConfiguration};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: SessionController,
    pub log: ConversationLog,
    /// Model/prompt configuration captured in telemetry exports
    pub configuration: SessionConfiguration,
    /// Opaque tool definitions, order preserved in exports
    pub tools: Vec<serde_json::Value>,
    pub sink: Arc<dyn ArtifactSink>,
}
