mod message;

pub use message::{estimate_token_count, Message, MessageId, MessageRole, MessageStatus};

// The session entity is the wire shape; the store holds the same record.
pub use planwise_sdk::types::{Session, SessionContext, SessionStatus};
