mod admin_session;
mod api_key;
mod json_body;
mod login_form;

pub use admin_session::{AdminSession, PanelSession, authenticate, user_agent};
pub use api_key::ApiKey;
pub use json_body::JsonBody;
pub use login_form::{LoginBodyKind, LoginForm};
