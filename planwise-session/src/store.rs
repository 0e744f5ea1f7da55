use std::sync::{Arc, Mutex};
use std::time::Duration;

use planwise_sdk::error::{ErrorKind, PlannerError};

use crate::types::{Message, MessageId, MessageRole, MessageStatus, Session, SessionStatus};

/// UI-facing error flags. Two instances live in the state: `error` for
/// general operations and `ai_error` for the assistant-response path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorState {
    pub has_error: bool,
    pub kind: Option<ErrorKind>,
    pub message: Option<String>,
    pub is_timeout: bool,
}

impl ErrorState {
    pub fn from_error(error: &PlannerError) -> Self {
        let kind = error.kind();
        Self {
            has_error: true,
            kind: Some(kind),
            message: Some(error.to_string()),
            is_timeout: kind == ErrorKind::Timeout,
        }
    }
}

/// Bookkeeping for the in-flight session creation. Reset on success.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationRetryInfo {
    /// Attempts that have failed so far
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_error_kind: ErrorKind,
    pub last_error_message: String,
    /// Epoch milliseconds
    pub last_attempt_at: i64,
}

/// Everything the rendering layer reads, in one place.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_typing: bool,
    /// Backoff delay currently being waited out, if any
    pub estimated_wait: Option<Duration>,
    pub error: ErrorState,
    pub ai_error: ErrorState,
    pub creation_retry: Option<CreationRetryInfo>,
}

/// Field-level patch for a stored message. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub status: Option<MessageStatus>,
    pub content: Option<String>,
    pub optimistic: Option<bool>,
    pub attempt: Option<u32>,
    pub retry_count: Option<u32>,
    pub token_count: Option<u32>,
}

/// Single source of truth for session list, active session, message list,
/// and the transient UI flags.
///
/// Every mutation locks, applies one full transformation, and releases, so
/// concurrent writers (streaming callback, lifecycle manager, a retry)
/// serialize in emission order and a read immediately after a write sees it.
/// Handles are values: `Clone` shares the underlying state, and tests
/// construct independent stores freely.
// NOTE: std::sync::Mutex since no lock is ever held across an .await.
#[derive(Clone, Default)]
pub struct ConversationStore {
    state: Arc<Mutex<ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy of the current state for rendering or assertions.
    pub fn snapshot(&self) -> ConversationState {
        self.state.lock().unwrap().clone()
    }

    // --- sessions ---

    pub fn replace_sessions(&self, sessions: Vec<Session>) {
        let mut state = self.state.lock().unwrap();
        state.sessions = sessions;
        if let Some(active) = state.active_session_id.clone() {
            if !state.sessions.iter().any(|s| s.id == active) {
                state.active_session_id = None;
            }
        }
    }

    pub fn push_session(&self, session: Session) {
        self.state.lock().unwrap().sessions.push(session);
    }

    pub fn set_active_session(&self, session_id: Option<&str>) {
        self.state.lock().unwrap().active_session_id = session_id.map(|s| s.to_string());
    }

    pub fn active_session(&self) -> Option<Session> {
        let state = self.state.lock().unwrap();
        let active = state.active_session_id.as_deref()?;
        state.sessions.iter().find(|s| s.id == active).cloned()
    }

    pub fn find_session(&self, session_id: &str) -> Option<Session> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
    }

    /// Hard delete from the in-memory list. Drops the session's messages
    /// and clears the active selection if it pointed here.
    pub fn remove_session(&self, session_id: &str) {
        let mut state = self.state.lock().unwrap();
        state.sessions.retain(|s| s.id != session_id);
        state.messages.retain(|m| m.session_id != session_id);
        if state.active_session_id.as_deref() == Some(session_id) {
            state.active_session_id = None;
        }
    }

    pub fn rename_session(&self, session_id: &str, title: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.title = title.to_string();
        }
    }

    pub fn set_session_status(&self, session_id: &str, status: SessionStatus) {
        let mut state = self.state.lock().unwrap();
        if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
            session.status = status;
        }
    }

    // --- messages ---

    pub fn append_message(&self, message: Message) {
        self.state.lock().unwrap().messages.push(message);
    }

    pub fn clear_messages(&self) {
        self.state.lock().unwrap().messages.clear();
    }

    pub fn messages_for(&self, session_id: &str) -> Vec<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn find_message(&self, id: &MessageId) -> Option<Message> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .find(|m| m.id.matches(id))
            .cloned()
    }

    /// Apply a field patch to the message with the given identity.
    /// Returns false when no such message exists.
    pub fn patch_message(&self, id: &MessageId, patch: MessagePatch) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(message) = state.messages.iter_mut().find(|m| m.id.matches(id)) else {
            return false;
        };
        if let Some(status) = patch.status {
            message.status = status;
        }
        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(optimistic) = patch.optimistic {
            message.optimistic = optimistic;
        }
        if let Some(attempt) = patch.attempt {
            message.attempt = attempt;
        }
        if let Some(retry_count) = patch.retry_count {
            message.retry_count = retry_count;
        }
        if let Some(token_count) = patch.token_count {
            message.token_count = Some(token_count);
        }
        true
    }

    /// Promote a message's identity to its durable form.
    pub fn confirm_message(&self, id: &MessageId) {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.messages.iter_mut().find(|m| m.id.matches(id)) {
            message.id = message.id.confirmed();
        }
    }

    /// Identity of the assistant reply paired with a user message: the
    /// first assistant message appended after it in the same session.
    pub fn reply_for(&self, user_id: &MessageId) -> Option<MessageId> {
        let state = self.state.lock().unwrap();
        let position = state.messages.iter().position(|m| m.id.matches(user_id))?;
        let session_id = &state.messages[position].session_id;
        state.messages[position + 1..]
            .iter()
            .find(|m| m.role == MessageRole::Assistant && &m.session_id == session_id)
            .map(|m| m.id.clone())
    }

    // --- flags ---

    pub fn set_loading(&self, loading: bool) {
        self.state.lock().unwrap().is_loading = loading;
    }

    pub fn set_typing(&self, typing: bool) {
        self.state.lock().unwrap().is_typing = typing;
    }

    pub fn set_estimated_wait(&self, wait: Option<Duration>) {
        self.state.lock().unwrap().estimated_wait = wait;
    }

    pub fn set_error(&self, error: &PlannerError) {
        self.state.lock().unwrap().error = ErrorState::from_error(error);
    }

    pub fn clear_error(&self) {
        self.state.lock().unwrap().error = ErrorState::default();
    }

    pub fn set_ai_error(&self, error: &PlannerError) {
        self.state.lock().unwrap().ai_error = ErrorState::from_error(error);
    }

    pub fn clear_ai_error(&self) {
        self.state.lock().unwrap().ai_error = ErrorState::default();
    }

    pub fn set_creation_retry(&self, info: CreationRetryInfo) {
        self.state.lock().unwrap().creation_retry = Some(info);
    }

    pub fn clear_creation_retry(&self) {
        self.state.lock().unwrap().creation_retry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planwise_sdk::types::SessionContext;

    fn session(id: &str) -> Session {
        Session {
            id: id.to_string(),
            owner_id: "user-1".to_string(),
            title: format!("Session {}", id),
            context: SessionContext::new("SaaS", "SMBs", "retention"),
            status: SessionStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn writes_are_visible_immediately() {
        let store = ConversationStore::new();
        store.push_session(session("a"));
        store.set_active_session(Some("a"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.sessions.len(), 1);
        assert_eq!(snapshot.active_session_id.as_deref(), Some("a"));
        assert_eq!(store.active_session().unwrap().id, "a");
    }

    #[test]
    fn clone_shares_state() {
        let store = ConversationStore::new();
        let handle = store.clone();
        handle.set_loading(true);
        assert!(store.snapshot().is_loading);
    }

    #[test]
    fn independent_stores_do_not_share_state() {
        let a = ConversationStore::new();
        let b = ConversationStore::new();
        a.set_loading(true);
        assert!(!b.snapshot().is_loading);
    }

    #[test]
    fn patch_finds_message_across_confirmation() {
        let store = ConversationStore::new();
        let message = Message::user("sess-1", "hello", 3);
        let id = message.id.clone();
        store.append_message(message);

        store.confirm_message(&id);
        // The pending handle still addresses the confirmed message.
        assert!(store.patch_message(
            &id,
            MessagePatch {
                status: Some(MessageStatus::Completed),
                ..MessagePatch::default()
            }
        ));

        let stored = store.find_message(&id).unwrap();
        assert!(stored.id.is_confirmed());
        assert_eq!(stored.status, MessageStatus::Completed);
    }

    #[test]
    fn patch_of_unknown_message_reports_false() {
        let store = ConversationStore::new();
        assert!(!store.patch_message(&MessageId::new(), MessagePatch::default()));
    }

    #[test]
    fn reply_for_finds_the_paired_assistant_message() {
        let store = ConversationStore::new();
        let user = Message::user("sess-1", "q", 3);
        let user_id = user.id.clone();
        let assistant = Message::assistant_placeholder("sess-1", 3);
        let assistant_id = assistant.id.clone();
        store.append_message(user);
        store.append_message(assistant);

        assert!(store.reply_for(&user_id).unwrap().matches(&assistant_id));
    }

    #[test]
    fn remove_session_clears_selection_and_messages() {
        let store = ConversationStore::new();
        store.push_session(session("a"));
        store.set_active_session(Some("a"));
        store.append_message(Message::user("a", "hello", 3));

        store.remove_session("a");

        let snapshot = store.snapshot();
        assert!(snapshot.sessions.is_empty());
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.active_session_id.is_none());
    }

    #[test]
    fn replace_sessions_drops_stale_selection() {
        let store = ConversationStore::new();
        store.push_session(session("a"));
        store.set_active_session(Some("a"));

        store.replace_sessions(vec![session("b")]);

        assert!(store.snapshot().active_session_id.is_none());
    }

    #[test]
    fn error_state_reflects_timeout_kind() {
        let store = ConversationStore::new();
        store.set_ai_error(&PlannerError::Timeout);

        let ai_error = store.snapshot().ai_error;
        assert!(ai_error.has_error);
        assert_eq!(ai_error.kind, Some(ErrorKind::Timeout));
        assert!(ai_error.is_timeout);

        store.clear_ai_error();
        assert!(!store.snapshot().ai_error.has_error);
    }
}
