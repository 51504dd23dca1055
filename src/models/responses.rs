use serde::{Deserialize, Serialize};
use crate::core::Keyboard;
use crate::models::domain::PhotoRef;

/// A reply the dialogue core asks the transport to deliver
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub user_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub attachments: Vec<PhotoRef>,
}

impl OutboundMessage {
    pub fn text(user_id: i64, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            keyboard: None,
            attachments: Vec::new(),
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<PhotoRef>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Comma-joined attachment list, `None` when there is nothing to attach
    pub fn attachment_list(&self) -> Option<String> {
        if self.attachments.is_empty() {
            return None;
        }
        Some(
            self.attachments
                .iter()
                .map(PhotoRef::attachment)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
