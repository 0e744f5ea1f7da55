//! # Planwise Session
//!
//! Orchestration for the business-planner chat: the conversation state
//! store, the turn executor, and the session lifecycle manager. The HTTP
//! surface lives in `planwise-sdk` and is injected behind `PlannerApi`, so
//! every piece here runs against scripted backends in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use planwise_sdk::http::HttpPlannerClient;
//! use planwise_sdk::reporter::{ErrorSink, NoopErrorSink};
//! use planwise_sdk::types::{CreateSessionRequest, SessionContext};
//! use planwise_session::config::PlannerConfig;
//! use planwise_session::executor::TurnExecutor;
//! use planwise_session::lifecycle::SessionLifecycleManager;
//! use planwise_session::store::ConversationStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlannerConfig::default();
//!     let api = Arc::new(HttpPlannerClient::new("https://api.planwise.app/v1", "token")?);
//!     let sink: Arc<dyn ErrorSink> = Arc::new(NoopErrorSink);
//!     let store = ConversationStore::new();
//!
//!     let executor = Arc::new(TurnExecutor::new(
//!         api.clone(),
//!         store.clone(),
//!         sink.clone(),
//!         &config,
//!     ));
//!     let manager =
//!         SessionLifecycleManager::new(api, store.clone(), sink, executor, &config);
//!
//!     manager
//!         .create_session(
//!             CreateSessionRequest {
//!                 title: None,
//!                 context: SessionContext::new("SaaS", "SMBs", "retention"),
//!             },
//!             "How do I reduce churn?",
//!         )
//!         .await?;
//!
//!     for message in store.snapshot().messages {
//!         println!("{}: {}", message.role.as_str(), message.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod executor;
pub mod lifecycle;
pub mod retry;
pub mod store;
pub mod types;
