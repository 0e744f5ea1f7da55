//! # Planwise SDK
//!
//! Client crate for the planner backend: wire types, the classified error
//! taxonomy, the streamed-reply reader, and the fire-and-forget error
//! reporter. Orchestration lives in `planwise-session`; this crate only
//! talks HTTP.
//!
//! ## Example
//!
//! ```rust,no_run
//! use planwise_sdk::http::HttpPlannerClient;
//! use planwise_sdk::client::PlannerApi;
//! use planwise_sdk::stream::read_reply;
//! use planwise_sdk::types::{CreateSessionRequest, SendMessageRequest, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpPlannerClient::new("https://api.planwise.app/v1", "token")?;
//!
//!     let session = client
//!         .create_session(CreateSessionRequest {
//!             title: None,
//!             context: SessionContext::new("SaaS", "SMBs", "retention"),
//!         })
//!         .await?;
//!
//!     let stream = client
//!         .send_message(
//!             &session.id,
//!             SendMessageRequest {
//!                 message: "How do I reduce churn?".to_string(),
//!             },
//!         )
//!         .await?;
//!
//!     let reply = read_reply(stream, |so_far| println!("{}", so_far)).await?;
//!     println!("full reply: {}", reply);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod reporter;
pub mod stream;
pub mod types;
