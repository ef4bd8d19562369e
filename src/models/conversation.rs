use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

use super::message::Message;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
    pub last_activity_at: DateTime<Utc>,
    /// Short snapshot of the most recent meaningful content, shown in
    /// the sidebar.
    pub preview: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Fresh, empty conversation with placeholder title and preview.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: config::DEFAULT_CONVERSATION_TITLE.to_string(),
            pinned: false,
            last_activity_at: Utc::now(),
            preview: config::EMPTY_CONVERSATION_PREVIEW.to_string(),
            messages: Vec::new(),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
