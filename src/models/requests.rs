use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Event delivered by the VK Callback API
///
/// ```json
/// {
///   "type": "message_new",
///   "group_id": 123,
///   "secret": "string",
///   "object": { "message": { "from_id": 1, "text": "Привет" } }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CallbackEvent {
    #[validate(length(min = 1))]
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub object: Value,
}

impl CallbackEvent {
    /// Extract the inbound chat message from a `message_new` event
    pub fn message(&self) -> Option<InboundMessage> {
        if self.event_type != "message_new" {
            return None;
        }
        // Callback API v5.103+ nests the message; older versions send it flat
        let raw = self.object.get("message").unwrap_or(&self.object);
        serde_json::from_value(raw.clone()).ok()
    }
}

/// A text message written to the community by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub from_id: i64,
    #[serde(default)]
    pub text: String,
}
