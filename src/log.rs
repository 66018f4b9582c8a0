//! Conversation log store
//!
//! Accumulates the turns of the current conversation. The session
//! controller never writes here; turns arrive from the presentation layer
//! and from the remote agent, and the telemetry exporter reads a snapshot
//! at export time. `clear` is the UI "reset" action and deliberately leaves
//! the active connection untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Agent,
    System,
}

/// A single turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Shared, ordered store of conversation turns
#[derive(Clone, Default)]
pub struct ConversationLog {
    turns: Arc<Mutex<Vec<ConversationTurn>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ConversationTurn>> {
        match self.turns.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, turn: ConversationTurn) {
        self.lock().push(turn);
    }

    /// Ordered snapshot of all accumulated turns.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.lock().clone()
    }

    /// Clear accumulated turns (the "reset" action).
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
