use serde::Deserialize;

pub(crate) const DEFAULT_API_KEY: &str = "change-me";
pub(crate) const DEFAULT_PASSWORD: &str = "admin";

/// Credentials guarding the mutation surface.
///
/// `api_key` is the shared secret for the scripted `/update` endpoint,
/// `username`/`password` gate the browser panel.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AdminConfig {
    pub api_key: String,
    pub username: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: String::from(DEFAULT_API_KEY),
            username: String::from("admin"),
            password: String::from(DEFAULT_PASSWORD),
        }
    }
}

impl AdminConfig {
    pub fn uses_default_secrets(&self) -> bool {
        self.api_key == DEFAULT_API_KEY || self.password == DEFAULT_PASSWORD
    }
}
