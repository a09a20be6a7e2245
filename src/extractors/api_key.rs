use crate::common::ApiError;
use crate::state::AppState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Grants access to the scripted mutation endpoint.
///
/// The admin key may be sent as `Authorization: Bearer <key>` or as the raw
/// header value.
pub struct ApiKey;

impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match parse_authorization(&parts.headers) {
            Some(key) if key == state.config.admin.api_key => Ok(Self),
            _ => {
                tracing::warn!("Rejected request to {} with a bad admin key", parts.uri.path());
                Err(ApiError::Unauthorized)
            }
        }
    }
}

pub(crate) fn parse_authorization(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim_start();
    let key = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        // a bare scheme carries no credential
        None if value.trim_end().eq_ignore_ascii_case("bearer") => "",
        _ => value.trim(),
    };
    (!key.is_empty()).then_some(key)
}
