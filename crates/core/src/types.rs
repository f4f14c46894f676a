use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a client session
///
/// Generated by the server when a stream opens and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Result of one tool dispatch
///
/// Produced fresh for every call and never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub display_text: String,
    pub structured_payload: serde_json::Value,
    pub presentation_metadata: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_distinct() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_id_round_trips_through_display() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        assert!("nonexistent".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_tool_result_uses_camel_case() {
        let result = ToolResult {
            display_text: "hello".to_string(),
            structured_payload: serde_json::json!({"a": 1}),
            presentation_metadata: serde_json::Map::new(),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["displayText"], "hello");
        assert_eq!(value["structuredPayload"]["a"], 1);
        assert!(value["presentationMetadata"].is_object());
    }
}
