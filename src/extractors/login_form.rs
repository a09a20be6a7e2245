use crate::common::ApiError;
use crate::models::dtos::auth::LoginBodyDto;
use axum::Json;
use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBodyKind {
    Json,
    Form,
}

/// Login credentials from either a JSON or an URL-encoded form body.
#[derive(Debug)]
pub struct LoginForm {
    pub credentials: LoginBodyDto,
    pub kind: LoginBodyKind,
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|it| it.to_str().ok())
        .and_then(|it| it.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let Json(credentials) = Json::<LoginBodyDto>::from_request(req, state)
                .await
                .map_err(|err| ApiError::BadRequest(anyhow::anyhow!(err.body_text())))?;
            Ok(Self {
                credentials,
                kind: LoginBodyKind::Json,
            })
        } else {
            let Form(credentials) = Form::<LoginBodyDto>::from_request(req, state)
                .await
                .map_err(|err| ApiError::BadRequest(anyhow::anyhow!(err.body_text())))?;
            Ok(Self {
                credentials,
                kind: LoginBodyKind::Form,
            })
        }
    }
}
