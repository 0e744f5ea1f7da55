use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;

use crate::{
    client::{PlannerApi, ReplyStream},
    error::PlannerError,
    types::{
        ApiErrorBody, CreateSessionRequest, SendMessageRequest, Session, SessionEnvelope,
        SessionListResponse, SessionPage, SessionStatus, UpdateSessionRequest,
    },
};

/// HTTP client for the planner backend
///
/// The credential is opaque to this crate; it is attached as a bearer token
/// and never inspected. Attempt deadlines are owned by the orchestration
/// layer, so the underlying client only carries a long safety timeout.
pub struct HttpPlannerClient {
    base_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl HttpPlannerClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, PlannerError> {
        let token = token.into();
        if token.is_empty() {
            return Err(PlannerError::validation("Credential cannot be empty"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| PlannerError::Network { source: e })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            http_client,
        })
    }

    fn headers(&self) -> Result<HeaderMap, PlannerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|_| PlannerError::validation("Invalid credential format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn update_session(
        &self,
        session_id: &str,
        request: UpdateSessionRequest,
    ) -> Result<Session, PlannerError> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);

        let response = self
            .http_client
            .patch(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let envelope: SessionEnvelope = response
                .json()
                .await
                .map_err(|e| PlannerError::unknown(format!("Failed to parse response: {}", e)))?;
            Ok(envelope.session)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Map a non-2xx response to a classified error.
///
/// The backend's error body is `{code, message}`; a body that fails to parse
/// falls back to the raw text so nothing is lost.
async fn error_from_response(response: reqwest::Response) -> PlannerError {
    let status = response.status();

    // Get retry-after before consuming the response
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok());

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let (code, message) = match serde_json::from_str::<ApiErrorBody>(&error_text) {
        Ok(body) => (body.code, body.message),
        Err(_) => (None, error_text),
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => PlannerError::rate_limit(message, retry_after),
        StatusCode::BAD_REQUEST => PlannerError::validation(message),
        s if s.is_server_error() => PlannerError::server(s.as_u16(), message),
        s => PlannerError::api_error(s.as_u16(), code, message),
    }
}

#[async_trait]
impl PlannerApi for HttpPlannerClient {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session, PlannerError> {
        let url = format!("{}/sessions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let envelope: SessionEnvelope = response
                .json()
                .await
                .map_err(|e| PlannerError::unknown(format!("Failed to parse response: {}", e)))?;
            Ok(envelope.session)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn send_message(
        &self,
        session_id: &str,
        request: SendMessageRequest,
    ) -> Result<ReplyStream, PlannerError> {
        let url = format!("{}/sessions/{}/messages", self.base_url, session_id);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let stream = response.bytes_stream().map_err(PlannerError::from);
            Ok(Box::pin(stream))
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn list_sessions(&self, page: SessionPage) -> Result<Vec<Session>, PlannerError> {
        let url = format!("{}/sessions", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers()?)
            .query(&[("limit", page.limit), ("offset", page.offset)])
            .send()
            .await?;

        if response.status().is_success() {
            let list: SessionListResponse = response
                .json()
                .await
                .map_err(|e| PlannerError::unknown(format!("Failed to parse response: {}", e)))?;
            Ok(list.sessions)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), PlannerError> {
        let url = format!("{}/sessions/{}", self.base_url, session_id);

        let response = self
            .http_client
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn rename_session(&self, session_id: &str, title: &str) -> Result<Session, PlannerError> {
        self.update_session(
            session_id,
            UpdateSessionRequest {
                title: Some(title.to_string()),
                status: None,
            },
        )
        .await
    }

    async fn archive_session(&self, session_id: &str) -> Result<Session, PlannerError> {
        self.update_session(
            session_id,
            UpdateSessionRequest {
                title: None,
                status: Some(SessionStatus::Archived),
            },
        )
        .await
    }
}
