use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginBodyDto {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginBodyDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginBodyDto")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
