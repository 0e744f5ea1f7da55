use crate::{
    error::PlannerError,
    types::{CreateSessionRequest, SendMessageRequest, Session, SessionPage},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

/// Raw assistant-reply body: undecoded text chunks in arrival order.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<Bytes, PlannerError>> + Send>>;

/// Core trait for the planner backend
///
/// Orchestration code holds `Arc<dyn PlannerApi>` so tests can inject
/// scripted implementations in place of the HTTP client.
#[async_trait]
pub trait PlannerApi: Send + Sync {
    /// Create a session (`POST /sessions`)
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session, PlannerError>;

    /// Open one conversational turn (`POST /sessions/{id}/messages`).
    /// A 2xx response yields the streamed assistant reply.
    async fn send_message(
        &self,
        session_id: &str,
        request: SendMessageRequest,
    ) -> Result<ReplyStream, PlannerError>;

    /// List sessions with pagination (`GET /sessions`)
    async fn list_sessions(&self, page: SessionPage) -> Result<Vec<Session>, PlannerError>;

    /// Delete a session (`DELETE /sessions/{id}`)
    async fn delete_session(&self, session_id: &str) -> Result<(), PlannerError>;

    /// Rename a session (`PATCH /sessions/{id}`)
    async fn rename_session(&self, session_id: &str, title: &str) -> Result<Session, PlannerError>;

    /// Archive a session (`PATCH /sessions/{id}`)
    async fn archive_session(&self, session_id: &str) -> Result<Session, PlannerError>;
}
