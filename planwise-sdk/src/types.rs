use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Planning context captured when a session is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Kind of business being planned (e.g., "SaaS")
    pub business_type: String,
    /// Who the business sells to
    pub target_market: String,
    /// The main problem the user wants to work on
    pub challenge: String,
    /// Optional free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SessionContext {
    pub fn new(
        business_type: impl Into<String>,
        target_market: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            business_type: business_type.into(),
            target_market: target_market.into(),
            challenge: challenge.into(),
            details: None,
        }
    }

    /// Check the three required fields before any network call.
    /// Whitespace-only values count as empty.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.business_type.trim().is_empty() {
            return Err(PlannerError::validation("business_type is required"));
        }
        if self.target_market.trim().is_empty() {
            return Err(PlannerError::validation("target_market is required"));
        }
        if self.challenge.trim().is_empty() {
            return Err(PlannerError::validation("challenge is required"));
        }
        Ok(())
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Archived,
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => SessionStatus::Active,
            "completed" => SessionStatus::Completed,
            "archived" => SessionStatus::Archived,
            _ => SessionStatus::Active,
        }
    }
}

/// A planning session as the backend stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Identity of the owning caller; assigned by the backend
    pub owner_id: String,
    pub title: String,
    pub context: SessionContext,
    pub status: SessionStatus,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
}

/// Body of `POST /sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub context: SessionContext,
}

/// Body of `POST /sessions/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// Body of `PATCH /sessions/{id}` (rename and archive share it)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

/// Pagination window for `GET /sessions`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionPage {
    pub limit: u32,
    pub offset: u32,
}

impl Default for SessionPage {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// 2xx envelope around a single session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub session: Session,
}

/// 2xx envelope around the paginated list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

/// Error body every endpoint returns on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
