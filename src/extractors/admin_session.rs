use crate::common::ApiError;
use crate::models::Session;
use crate::services::SessionRejection;
use crate::state::AppState;
use crate::utils::cookie::{SESSION_COOKIE, read_cookie};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{LOCATION, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// Proof of a valid panel session. Rejects with `401 not_authenticated`.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

/// Same check for browser-navigated pages. Rejects with a redirect to the login page.
#[derive(Debug, Clone, Copy)]
pub struct PanelSession;

pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(LOCATION, "/admin/login")]).into_response()
    }
}

pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|it| it.to_str().ok())
}

/// Validates the session cookie carried by `headers`, refreshing its idle timer.
pub fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Session, SessionRejection> {
    let token = read_cookie(headers, SESSION_COOKIE).ok_or(SessionRejection::Unknown)?;
    match state.sessions.validate(token, user_agent(headers)) {
        Ok(session) => Ok(session),
        Err(rejection) => {
            match rejection {
                SessionRejection::Expired => tracing::info!("Admin session expired after idling"),
                SessionRejection::UserAgentMismatch => {
                    tracing::warn!("Admin session dropped: user agent changed")
                }
                SessionRejection::Unknown => tracing::debug!("Unknown admin session presented"),
            }
            Err(rejection)
        }
    }
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(&parts.headers, &state)
            .map(|_| Self)
            .map_err(|_| ApiError::NotAuthenticated)
    }
}

impl<S> FromRequestParts<S> for PanelSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = LoginRedirect;
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(&parts.headers, &state)
            .map(|_| Self)
            .map_err(|_| LoginRedirect)
    }
}
