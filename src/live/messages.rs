use serde::{Deserialize, Serialize};

/// Realtime audio input published to the live session
#[derive(Debug, Serialize, Deserialize)]
pub struct RealtimeInputMessage {
    pub session_id: String,
    /// Always `audio/pcm;rate=16000`
    pub mime_type: String,
    /// Base64-encoded PCM bytes
    pub data: String,
    pub sequence: u32,
    /// RFC3339 timestamp
    pub timestamp: String,
}

/// Conversation turn received back from the remote agent
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerTurnMessage {
    pub session_id: String,
    pub role: String,
    pub text: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_input_serializes_expected_fields() {
        let msg = RealtimeInputMessage {
            session_id: "console-1".into(),
            mime_type: "audio/pcm;rate=16000".into(),
            data: "AAAA".into(),
            sequence: 7,
            timestamp: "2025-01-01T00:00:00Z".into(),
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["mime_type"], "audio/pcm;rate=16000");
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["session_id"], "console-1");
    }

    #[test]
    fn server_turn_deserializes() {
        let json = r#"{
            "session_id": "console-1",
            "role": "agent",
            "text": "Hello there",
            "timestamp": "2025-01-01T00:00:01Z"
        }"#;

        let msg: ServerTurnMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, "agent");
        assert_eq!(msg.text, "Hello there");
    }
}
