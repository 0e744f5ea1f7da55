use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use planwise_sdk::client::PlannerApi;
use planwise_sdk::error::PlannerError;
use planwise_sdk::reporter::{report_error, ErrorSink};
use planwise_sdk::types::{CreateSessionRequest, Session, SessionContext, SessionPage};

use crate::config::PlannerConfig;
use crate::executor::TurnExecutor;
use crate::retry::RetryPolicy;
use crate::store::{ConversationStore, CreationRetryInfo};


/// The last failed creation, kept so the dedicated retry action can
/// re-issue it.
struct PendingCreation {
    request: CreateSessionRequest,
    first_message: String,
    /// Attempt index a retry would continue from
    next_attempt: u32,
    last_error_transient: bool,
}

/// Owns session creation and the session CRUD surface.
///
/// Creating a session and delivering its first message is one logical
/// operation: a successful creation immediately hands the message to the
/// turn executor against the new session id.
pub struct SessionLifecycleManager {
    api: Arc<dyn PlannerApi>,
    store: ConversationStore,
    sink: Arc<dyn ErrorSink>,
    executor: Arc<TurnExecutor>,
    policy: RetryPolicy,
    timeout: Duration,
    pending: Mutex<Option<PendingCreation>>,
}

impl SessionLifecycleManager {
    pub fn new(
        api: Arc<dyn PlannerApi>,
        store: ConversationStore,
        sink: Arc<dyn ErrorSink>,
        executor: Arc<TurnExecutor>,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            api,
            store,
            sink,
            executor,
            policy: config.retry_policy(),
            timeout: config.request_timeout(),
            pending: Mutex::new(None),
        }
    }

    pub fn executor(&self) -> &Arc<TurnExecutor> {
        &self.executor
    }

    /// Create a session and send its first message.
    ///
    /// Invalid context fails locally with zero network calls. Transient
    /// creation failures retry with a growing backoff up to the policy
    /// ceiling; the terminal error stays available for `retry_create`.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
        first_message: &str,
    ) -> Result<Session, PlannerError> {
        if let Err(error) = request.context.validate() {
            report_error(&self.sink, &error, "create_session");
            self.store.set_error(&error);
            tracing::warn!(error = %error, "session context rejected");
            return Err(error);
        }

        let request = with_default_title(request);
        self.create_with_retries(request, first_message.to_string(), 0)
            .await
    }

    /// Re-issue the last failed creation, only if its error was transient
    /// and the retry ceiling is unreached; otherwise the failure is final.
    pub async fn retry_create(&self) -> Result<Session, PlannerError> {
        let pending = self.pending.lock().unwrap().take();
        let Some(pending) = pending else {
            return Err(PlannerError::validation(
                "No failed session creation to retry",
            ));
        };

        if !pending.last_error_transient || pending.next_attempt > self.policy.max_retries {
            return Err(PlannerError::validation(
                "Session creation can no longer be retried",
            ));
        }

        self.create_with_retries(pending.request, pending.first_message, pending.next_attempt)
            .await
    }

    async fn create_with_retries(
        &self,
        request: CreateSessionRequest,
        first_message: String,
        start_attempt: u32,
    ) -> Result<Session, PlannerError> {
        let mut attempt = start_attempt;

        loop {
            tracing::debug!(attempt, "creating session");

            let outcome = match tokio::time::timeout(
                self.timeout,
                self.api.create_session(request.clone()),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(PlannerError::Timeout),
            };

            let error = match outcome {
                Ok(session) => {
                    *self.pending.lock().unwrap() = None;
                    self.store.clear_creation_retry();
                    self.store.clear_error();
                    self.store.push_session(session.clone());
                    self.store.set_active_session(Some(&session.id));
                    self.store.clear_messages();
                    tracing::debug!(session_id = %session.id, "session created");

                    // The session exists either way; a failing first turn
                    // surfaces through the executor's own error state.
                    if let Err(error) = self.executor.send(&session.id, &first_message).await {
                        tracing::warn!(error = %error, "first message failed after creation");
                    }
                    return Ok(session);
                }
                Err(error) => error,
            };

            report_error(&self.sink, &error, "create_session");
            let transient = error.is_transient();
            tracing::warn!(attempt, error = %error, transient, "session creation failed");

            self.store.set_creation_retry(CreationRetryInfo {
                retry_count: attempt + 1,
                max_retries: self.policy.max_retries,
                last_error_kind: error.kind(),
                last_error_message: error.to_string(),
                last_attempt_at: Utc::now().timestamp_millis(),
            });

            if self.policy.should_retry(attempt, transient) {
                tokio::time::sleep(self.policy.session_backoff(attempt)).await;
                attempt += 1;
                continue;
            }

            self.store.set_error(&error);
            *self.pending.lock().unwrap() = Some(PendingCreation {
                request,
                first_message,
                next_attempt: attempt + 1,
                last_error_transient: transient,
            });
            return Err(error);
        }
    }

    // --- session CRUD against the external store ---

    pub async fn refresh_sessions(&self, page: SessionPage) -> Result<Vec<Session>, PlannerError> {
        match self.api.list_sessions(page).await {
            Ok(sessions) => {
                self.store.replace_sessions(sessions.clone());
                Ok(sessions)
            }
            Err(error) => {
                report_error(&self.sink, &error, "list_sessions");
                self.store.set_error(&error);
                Err(error)
            }
        }
    }

    /// Make a known session the active one. Message history lives with the
    /// backend, so the local log resets on switch.
    pub fn select_session(&self, session_id: &str) -> Result<(), PlannerError> {
        if self.store.find_session(session_id).is_none() {
            return Err(PlannerError::validation("Unknown session"));
        }
        self.store.set_active_session(Some(session_id));
        self.store.clear_messages();
        self.store.clear_ai_error();
        Ok(())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), PlannerError> {
        match self.api.delete_session(session_id).await {
            Ok(()) => {
                self.store.remove_session(session_id);
                Ok(())
            }
            Err(error) => {
                report_error(&self.sink, &error, "delete_session");
                self.store.set_error(&error);
                Err(error)
            }
        }
    }

    pub async fn rename_session(&self, session_id: &str, title: &str) -> Result<(), PlannerError> {
        match self.api.rename_session(session_id, title).await {
            Ok(session) => {
                self.store.rename_session(session_id, &session.title);
                Ok(())
            }
            Err(error) => {
                report_error(&self.sink, &error, "rename_session");
                self.store.set_error(&error);
                Err(error)
            }
        }
    }

    /// The normal end-of-life path; hard delete exists for the local list.
    pub async fn archive_session(&self, session_id: &str) -> Result<(), PlannerError> {
        match self.api.archive_session(session_id).await {
            Ok(session) => {
                self.store.set_session_status(session_id, session.status);
                Ok(())
            }
            Err(error) => {
                report_error(&self.sink, &error, "archive_session");
                self.store.set_error(&error);
                Err(error)
            }
        }
    }
}

fn with_default_title(mut request: CreateSessionRequest) -> CreateSessionRequest {
    let blank = request
        .title
        .as_deref()
        .map_or(true, |t| t.trim().is_empty());
    if blank {
        request.title = Some(default_title(&request.context));
    }
    request
}

fn default_title(context: &SessionContext) -> String {
    format!("Planning: {}", context.business_type.trim())
}
