use std::time::Duration;

/// Bounded retry policy shared by message sends and session creation.
///
/// Message sends wait a flat delay between attempts; session creation grows
/// its delay with the attempt index.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so `max_retries + 1` total attempts
    pub max_retries: u32,
    pub message_delay: Duration,
    pub session_base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            message_delay: Duration::from_secs(2),
            session_base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A non-transient error never retries, regardless of attempt count.
    /// `attempt` is zero-based.
    pub fn should_retry(&self, attempt: u32, is_transient: bool) -> bool {
        is_transient && attempt < self.max_retries
    }

    pub fn message_backoff(&self, _attempt: u32) -> Duration {
        self.message_delay
    }

    pub fn session_backoff(&self, attempt: u32) -> Duration {
        self.session_base_delay * (attempt + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_stop_at_the_ceiling() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0, true));
        assert!(policy.should_retry(2, true));
        assert!(!policy.should_retry(3, true));
        assert!(!policy.should_retry(10, true));
    }

    #[test]
    fn non_transient_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0, false));
    }

    #[test]
    fn message_backoff_is_flat() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.message_backoff(0), policy.message_backoff(2));
    }

    #[test]
    fn session_backoff_grows_with_attempt() {
        let policy = RetryPolicy {
            session_base_delay: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.session_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.session_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.session_backoff(2), Duration::from_millis(300));
    }
}
