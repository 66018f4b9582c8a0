use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::log::{ConversationTurn, TurnRole};

/// Model and prompt configuration captured in the export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfiguration {
    pub model: String,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
}

/// A conversation turn as written to the artifact, with the timestamp
/// normalized to an ISO-8601 string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: String,
}

impl From<&ConversationTurn> for ExportedTurn {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content.clone(),
            timestamp: turn
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// The exported artifact: configuration, tool definitions, and the ordered
/// conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub configuration: SessionConfiguration,
    /// Tool definitions are opaque to the exporter; order is preserved.
    pub tools: Vec<serde_json::Value>,
    pub conversation: Vec<ExportedTurn>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn exported_turn_normalizes_timestamp_to_iso8601() {
        let turn = ConversationTurn {
            role: TurnRole::User,
            content: "hello".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap(),
        };

        let exported = ExportedTurn::from(&turn);
        assert_eq!(exported.timestamp, "2025-06-01T12:30:45.000Z");
    }

    #[test]
    fn configuration_uses_camel_case_prompt_key() {
        let config = SessionConfiguration {
            model: "models/live-2.5".into(),
            system_prompt: "Be concise.".into(),
        };

        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("systemPrompt").is_some());
        assert!(json.get("system_prompt").is_none());
    }
}
