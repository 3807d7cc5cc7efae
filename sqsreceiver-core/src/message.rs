//! Buffered message model

use serde::{Deserialize, Serialize};

/// A message held in the receive buffer.
///
/// Serialized as `{"body": string|null, "priority": string|null}`. The receipt handle
/// of the source message is not kept once the message has been buffered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub body: Option<String>,
    pub priority: Option<String>,
}

impl Message {
    pub fn new(body: Option<String>, priority: Option<String>) -> Self {
        Self { body, priority }
    }

    /// Exact, case-sensitive comparison against the priority attribute.
    pub fn has_priority(&self, priority: &str) -> bool {
        self.priority.as_deref() == Some(priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let msg = Message::new(Some("hello".to_string()), None);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"body":"hello","priority":null}"#);
    }

    #[test]
    fn test_has_priority_is_case_sensitive() {
        let msg = Message::new(None, Some("urgent".to_string()));
        assert!(msg.has_priority("urgent"));
        assert!(!msg.has_priority("Urgent"));
        assert!(!Message::new(None, None).has_priority("urgent"));
    }
}
