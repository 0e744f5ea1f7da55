use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message identity through its lifecycle.
///
/// Every message starts with a client-assigned uuid so the UI can render it
/// before the backend has seen it. The backend never echoes an id of its
/// own: completing the turn confirms the uuid as the durable identifier.
/// Keeping the two phases as variants makes that reconciliation explicit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MessageId {
    Pending { temp: Uuid },
    Confirmed { id: String },
}

impl MessageId {
    pub fn new() -> Self {
        MessageId::Pending {
            temp: Uuid::new_v4(),
        }
    }

    /// The identifier value regardless of confirmation state.
    pub fn value(&self) -> String {
        match self {
            MessageId::Pending { temp } => temp.to_string(),
            MessageId::Confirmed { id } => id.clone(),
        }
    }

    /// Identity comparison across confirmation states: a pending id and its
    /// confirmed successor refer to the same message.
    pub fn matches(&self, other: &MessageId) -> bool {
        self.value() == other.value()
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, MessageId::Confirmed { .. })
    }

    /// Promote to the durable form, keeping the same value.
    pub fn confirmed(&self) -> MessageId {
        MessageId::Confirmed { id: self.value() }
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

/// Status within a single attempt. Monotone per attempt; a resubmission
/// starts a new attempt and may move a Failed message back to Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Streaming,
    Completed,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Streaming => "streaming",
            MessageStatus::Completed => "completed",
            MessageStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: String,
    pub role: MessageRole,
    /// Mutates in place while the reply streams
    pub content: String,
    pub token_count: Option<u32>,
    pub status: MessageStatus,
    /// Resubmissions performed for this message
    pub retry_count: u32,
    /// Zero-based attempt the message is currently on
    pub attempt: u32,
    pub max_retries: u32,
    /// Not yet confirmed by the backend
    pub optimistic: bool,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl Message {
    /// The optimistic user message written to the store before the network
    /// call goes out.
    pub fn user(session_id: impl Into<String>, content: impl Into<String>, max_retries: u32) -> Self {
        Self {
            id: MessageId::new(),
            session_id: session_id.into(),
            role: MessageRole::User,
            content: content.into(),
            token_count: None,
            status: MessageStatus::Pending,
            retry_count: 0,
            attempt: 0,
            max_retries,
            optimistic: true,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// The empty assistant placeholder the streamed reply accumulates into.
    pub fn assistant_placeholder(session_id: impl Into<String>, max_retries: u32) -> Self {
        Self {
            id: MessageId::new(),
            session_id: session_id.into(),
            role: MessageRole::Assistant,
            content: String::new(),
            token_count: None,
            status: MessageStatus::Streaming,
            retry_count: 0,
            attempt: 0,
            max_retries,
            optimistic: true,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

/// Rough token estimate for a completed reply. The wire carries no usage
/// data, so the UI's counter works from this approximation.
pub fn estimate_token_count(text: &str) -> u32 {
    (text.chars().count() as u32).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_id_matches_its_confirmed_form() {
        let id = MessageId::new();
        let confirmed = id.confirmed();

        assert!(id.matches(&confirmed));
        assert!(confirmed.is_confirmed());
        assert_eq!(id.value(), confirmed.value());
    }

    #[test]
    fn distinct_messages_get_distinct_ids() {
        let a = Message::user("sess-1", "hello", 3);
        let b = Message::user("sess-1", "hello", 3);
        assert!(!a.id.matches(&b.id));
    }

    #[test]
    fn user_message_starts_pending_and_optimistic() {
        let msg = Message::user("sess-1", "hello", 3);
        assert_eq!(msg.status, MessageStatus::Pending);
        assert!(msg.optimistic);
        assert_eq!(msg.attempt, 0);
        assert_eq!(msg.max_retries, 3);
    }

    #[test]
    fn placeholder_starts_streaming_and_empty() {
        let msg = Message::assistant_placeholder("sess-1", 3);
        assert_eq!(msg.status, MessageStatus::Streaming);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_token_count(""), 0);
        assert_eq!(estimate_token_count("word"), 1);
        assert_eq!(estimate_token_count("hello"), 2);
    }
}
