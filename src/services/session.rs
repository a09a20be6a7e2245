use crate::models::Session;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Unknown,
    Expired,
    UserAgentMismatch,
}

/// Volatile store of panel sessions.
///
/// Expired and mismatched sessions are evicted lazily when they are next
/// presented; nothing sweeps the map in the background.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // map stays consistent even if a holder panicked
        self.sessions.lock().unwrap_or_else(|it| it.into_inner())
    }

    pub fn create(&self, user_agent: Option<&str>) -> String {
        self.create_at(user_agent, Instant::now())
    }

    /// Issues a new session. Sessions already past the idle timeout are
    /// dropped here, since no request can revive them.
    pub fn create_at(&self, user_agent: Option<&str>, now: Instant) -> String {
        let token = generate_token();
        let session = Session::new(user_agent.map(str::to_string), now);
        let mut sessions = self.guard();
        sessions.retain(|_, it| !self.is_idle(it, now));
        sessions.insert(token.clone(), session);
        token
    }

    fn is_idle(&self, session: &Session, now: Instant) -> bool {
        now.saturating_duration_since(session.last_seen) > self.idle_timeout
    }

    pub fn validate(
        &self,
        token: &str,
        user_agent: Option<&str>,
    ) -> Result<Session, SessionRejection> {
        self.validate_at(token, user_agent, Instant::now())
    }

    /// Checks the session and refreshes `last_seen` under a single lock.
    pub fn validate_at(
        &self,
        token: &str,
        user_agent: Option<&str>,
        now: Instant,
    ) -> Result<Session, SessionRejection> {
        let mut sessions = self.guard();
        let (mismatch, expired) = {
            let session = sessions.get(token).ok_or(SessionRejection::Unknown)?;
            (
                session
                    .user_agent
                    .as_deref()
                    .is_some_and(|bound| Some(bound) != user_agent),
                self.is_idle(session, now),
            )
        };
        if mismatch {
            sessions.remove(token);
            return Err(SessionRejection::UserAgentMismatch);
        }
        if expired {
            sessions.remove(token);
            return Err(SessionRejection::Expired);
        }
        let session = sessions.get_mut(token).ok_or(SessionRejection::Unknown)?;
        session.last_seen = now;
        Ok(session.clone())
    }

    /// Removes the session, returning it if it was still held.
    pub fn destroy(&self, token: &str) -> Option<Session> {
        self.guard().remove(token)
    }

    #[cfg(test)]
    pub fn contains(&self, token: &str) -> bool {
        self.guard().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
