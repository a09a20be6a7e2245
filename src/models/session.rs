use std::time::{Duration, Instant};

/// Server-side record of one authenticated panel login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub created_at: Instant,
    pub last_seen: Instant,
    /// user agent the session is bound to, if the login supplied one
    pub user_agent: Option<String>,
}

impl Session {
    pub fn new(user_agent: Option<String>, now: Instant) -> Self {
        Self {
            created_at: now,
            last_seen: now,
            user_agent,
        }
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
