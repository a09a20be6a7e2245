use crate::config::Config;
use crate::services::{RecordStore, SessionManager};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn build(config: Config, store: Arc<dyn RecordStore>) -> Self {
        let sessions = Arc::new(SessionManager::new(config.session.idle_timeout()));
        Self {
            config: Arc::new(config),
            store,
            sessions,
        }
    }
}
