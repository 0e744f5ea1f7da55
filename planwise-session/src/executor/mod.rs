use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use planwise_sdk::client::PlannerApi;
use planwise_sdk::error::PlannerError;
use planwise_sdk::reporter::{report_error, ErrorSink};
use planwise_sdk::stream::read_reply;
use planwise_sdk::types::SendMessageRequest;
use tokio::sync::watch;

use crate::config::PlannerConfig;
use crate::retry::RetryPolicy;
use crate::store::{ConversationStore, MessagePatch};
use crate::types::{estimate_token_count, Message, MessageId, MessageRole, MessageStatus};


/// Drives one user-message → assistant-reply exchange.
///
/// The store reflects every phase: the optimistic user message and the
/// assistant placeholder appear before the network call goes out, stream
/// chunks land on the placeholder in read order, and failures leave the
/// partial reply visible. Transient failures retry up to the policy ceiling
/// with a flat backoff; everything else waits for an explicit `resend`.
pub struct TurnExecutor {
    api: Arc<dyn PlannerApi>,
    store: ConversationStore,
    sink: Arc<dyn ErrorSink>,
    policy: RetryPolicy,
    timeout: Duration,
    /// One in-flight turn per session; `cancel` signals through here
    active: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl TurnExecutor {
    pub fn new(
        api: Arc<dyn PlannerApi>,
        store: ConversationStore,
        sink: Arc<dyn ErrorSink>,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            api,
            store,
            sink,
            policy: config.retry_policy(),
            timeout: config.request_timeout(),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Send a user message and stream the assistant's reply into the store.
    ///
    /// Returns once the turn is terminal. Rejects a second concurrent turn
    /// against the same session; resubmitting a failed message goes through
    /// `resend` instead.
    pub async fn send(&self, session_id: &str, text: &str) -> Result<(), PlannerError> {
        let (cancel_rx, _guard) = self.register(session_id)?;

        let user = Message::user(session_id, text, self.policy.max_retries);
        let assistant = Message::assistant_placeholder(session_id, self.policy.max_retries);
        let user_id = user.id.clone();
        let assistant_id = assistant.id.clone();

        self.store.clear_ai_error();
        self.store.set_loading(true);
        self.store.set_typing(true);
        self.store.append_message(user);
        self.store.append_message(assistant);

        self.drive(session_id, text, &user_id, &assistant_id, 0, cancel_rx)
            .await
    }

    /// Resubmit a failed user message, keeping its identifier and bumping
    /// its attempt number by one.
    pub async fn resend(&self, message_id: &MessageId) -> Result<(), PlannerError> {
        let message = self
            .store
            .find_message(message_id)
            .ok_or_else(|| PlannerError::validation("Unknown message"))?;
        if message.role != MessageRole::User {
            return Err(PlannerError::validation("Only user messages can be resent"));
        }
        if message.status != MessageStatus::Failed {
            return Err(PlannerError::validation("Only failed messages can be resent"));
        }
        let assistant_id = self
            .store
            .reply_for(message_id)
            .ok_or_else(|| PlannerError::validation("Message has no reply placeholder"))?;

        let session_id = message.session_id.clone();
        let (cancel_rx, _guard) = self.register(&session_id)?;

        let attempt = message.attempt + 1;
        self.store.clear_ai_error();
        self.store.set_loading(true);
        self.store.set_typing(true);
        self.store.patch_message(
            message_id,
            MessagePatch {
                status: Some(MessageStatus::Pending),
                attempt: Some(attempt),
                retry_count: Some(message.retry_count + 1),
                optimistic: Some(true),
                ..MessagePatch::default()
            },
        );
        self.store.patch_message(
            &assistant_id,
            MessagePatch {
                status: Some(MessageStatus::Streaming),
                content: Some(String::new()),
                attempt: Some(attempt),
                optimistic: Some(true),
                ..MessagePatch::default()
            },
        );

        self.drive(
            &session_id,
            &message.content,
            message_id,
            &assistant_id,
            attempt,
            cancel_rx,
        )
        .await
    }

    /// Abort the session's in-flight turn, if any. Partial assistant
    /// content already applied to the store stays in place.
    pub fn cancel(&self, session_id: &str) -> bool {
        let active = self.active.lock().unwrap();
        match active.get(session_id) {
            Some(tx) => tx.send(true).is_ok(),
            None => false,
        }
    }

    fn register(
        &self,
        session_id: &str,
    ) -> Result<(watch::Receiver<bool>, TurnGuard<'_>), PlannerError> {
        let mut active = self.active.lock().unwrap();
        if active.contains_key(session_id) {
            return Err(PlannerError::validation(
                "A turn is already in flight for this session",
            ));
        }
        let (tx, rx) = watch::channel(false);
        active.insert(session_id.to_string(), tx);
        Ok((
            rx,
            TurnGuard {
                executor: self,
                session_id: session_id.to_string(),
            },
        ))
    }

    /// The attempt loop. Bounded by the retry policy; each iteration runs
    /// under the full-attempt timeout and can be interrupted by `cancel`.
    async fn drive(
        &self,
        session_id: &str,
        text: &str,
        user_id: &MessageId,
        assistant_id: &MessageId,
        start_attempt: u32,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> Result<(), PlannerError> {
        let mut attempt = start_attempt;

        loop {
            tracing::debug!(session_id, attempt, "sending message");

            let outcome = tokio::select! {
                _ = cancelled(&mut cancel_rx) => {
                    return self.finish_cancelled(user_id, assistant_id);
                }
                result = tokio::time::timeout(
                    self.timeout,
                    self.attempt_once(session_id, text, user_id, assistant_id),
                ) => match result {
                    Ok(outcome) => outcome,
                    // The elapsed deadline drops the attempt future, which
                    // aborts the underlying call.
                    Err(_) => Err(PlannerError::Timeout),
                },
            };

            let error = match outcome {
                Ok(full_text) => return self.finish_completed(user_id, assistant_id, &full_text),
                Err(error) => error,
            };

            report_error(&self.sink, &error, "send_message");
            let transient = error.is_transient();
            tracing::warn!(attempt, error = %error, transient, "message attempt failed");

            // Failed is visible during the retry wait; partial assistant
            // content stays in place.
            self.store.patch_message(
                user_id,
                MessagePatch {
                    status: Some(MessageStatus::Failed),
                    ..MessagePatch::default()
                },
            );
            self.store.patch_message(
                assistant_id,
                MessagePatch {
                    status: Some(MessageStatus::Failed),
                    ..MessagePatch::default()
                },
            );

            if !self.policy.should_retry(attempt, transient) {
                return self.finish_failed(error);
            }

            let delay = self.policy.message_backoff(attempt);
            self.store.set_estimated_wait(Some(delay));
            tokio::select! {
                _ = cancelled(&mut cancel_rx) => {
                    self.store.set_estimated_wait(None);
                    return self.finish_cancelled(user_id, assistant_id);
                }
                _ = tokio::time::sleep(delay) => {}
            }
            self.store.set_estimated_wait(None);

            // Re-enter with the next attempt; the turn replays from scratch.
            attempt += 1;
            self.store.patch_message(
                user_id,
                MessagePatch {
                    status: Some(MessageStatus::Pending),
                    attempt: Some(attempt),
                    retry_count: Some(attempt),
                    optimistic: Some(true),
                    ..MessagePatch::default()
                },
            );
            self.store.patch_message(
                assistant_id,
                MessagePatch {
                    status: Some(MessageStatus::Streaming),
                    content: Some(String::new()),
                    attempt: Some(attempt),
                    optimistic: Some(true),
                    ..MessagePatch::default()
                },
            );
        }
    }

    /// One network attempt: open the turn, then feed the streamed reply
    /// into the assistant placeholder chunk by chunk.
    async fn attempt_once(
        &self,
        session_id: &str,
        text: &str,
        user_id: &MessageId,
        assistant_id: &MessageId,
    ) -> Result<String, PlannerError> {
        let stream = self
            .api
            .send_message(
                session_id,
                SendMessageRequest {
                    message: text.to_string(),
                },
            )
            .await?;

        // Headers arrived: the backend accepted the user message.
        self.store.patch_message(
            user_id,
            MessagePatch {
                status: Some(MessageStatus::Completed),
                optimistic: Some(false),
                ..MessagePatch::default()
            },
        );

        let store = self.store.clone();
        let id = assistant_id.clone();
        let full_text = read_reply(stream, move |so_far| {
            store.patch_message(
                &id,
                MessagePatch {
                    content: Some(so_far.to_string()),
                    ..MessagePatch::default()
                },
            );
        })
        .await
        // Partial text is already in the store via the chunk callback.
        .map_err(|failure| failure.source)?;

        Ok(full_text)
    }

    fn finish_completed(
        &self,
        user_id: &MessageId,
        assistant_id: &MessageId,
        full_text: &str,
    ) -> Result<(), PlannerError> {
        self.store.patch_message(
            assistant_id,
            MessagePatch {
                status: Some(MessageStatus::Completed),
                content: Some(full_text.to_string()),
                optimistic: Some(false),
                token_count: Some(estimate_token_count(full_text)),
                ..MessagePatch::default()
            },
        );
        self.store.confirm_message(user_id);
        self.store.confirm_message(assistant_id);
        self.store.set_loading(false);
        self.store.set_typing(false);
        tracing::debug!("turn completed");
        Ok(())
    }

    fn finish_failed(&self, error: PlannerError) -> Result<(), PlannerError> {
        self.store.set_ai_error(&error);
        self.store.set_loading(false);
        self.store.set_typing(false);
        Err(error)
    }

    /// Cancellation is terminal but user-initiated: the messages fail, the
    /// partial reply stays, and no backend error kind is recorded.
    fn finish_cancelled(
        &self,
        user_id: &MessageId,
        assistant_id: &MessageId,
    ) -> Result<(), PlannerError> {
        self.store.patch_message(
            user_id,
            MessagePatch {
                status: Some(MessageStatus::Failed),
                ..MessagePatch::default()
            },
        );
        self.store.patch_message(
            assistant_id,
            MessagePatch {
                status: Some(MessageStatus::Failed),
                ..MessagePatch::default()
            },
        );
        self.store.set_loading(false);
        self.store.set_typing(false);
        self.store.set_ai_error(&PlannerError::Cancelled);
        tracing::debug!("turn cancelled");
        Err(PlannerError::Cancelled)
    }
}

/// Releases the session's turn slot even when the caller drops the send
/// future mid-await.
struct TurnGuard<'a> {
    executor: &'a TurnExecutor,
    session_id: String,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.executor
            .active
            .lock()
            .unwrap()
            .remove(&self.session_id);
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        // Sender gone without a cancel signal: treat as never-cancelled.
        std::future::pending::<()>().await;
    }
}
