use crate::common::{ApiError, ApiResult};
use crate::extractors::{
    AdminSession, JsonBody, LoginBodyKind, LoginForm, PanelSession, authenticate, user_agent,
};
use crate::models::DeviceCode;
use crate::models::dtos::device::{
    DeleteDeviceBodyDto, DeviceItemDto, ListResponseDto, SaveDeviceBodyDto, SaveResponseDto,
};
use crate::state::AppState;
use crate::utils::cookie::{SESSION_COOKIE, clear_session_cookie, read_cookie, session_cookie};
use axum::Json;
use axum::extract::State;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

static LOGIN_PAGE: &str = include_str!("../../public/login.html");
static ADMIN_PAGE: &str = include_str!("../../public/admin.html");

fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

pub async fn login_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if authenticate(&headers, &state).is_ok() {
        return found("/admin");
    }
    Html(LOGIN_PAGE).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    LoginForm { credentials, kind }: LoginForm,
) -> ApiResult<Response> {
    let admin = &state.config.admin;
    if credentials.username != admin.username || credentials.password != admin.password {
        tracing::warn!(username = %credentials.username, "Admin login rejected");
        return Err(ApiError::InvalidCredentials);
    }
    let token = state.sessions.create(user_agent(&headers));
    tracing::info!(
        username = %credentials.username,
        sessions = state.sessions.len(),
        idle_timeout_secs = state.sessions.idle_timeout().as_secs(),
        "Admin logged in"
    );
    let cookie = session_cookie(&token, state.config.session.secure_cookie);
    let response = match kind {
        LoginBodyKind::Form => (
            StatusCode::FOUND,
            [(SET_COOKIE, cookie), (LOCATION, String::from("/admin"))],
        )
            .into_response(),
        LoginBodyKind::Json => (
            [(SET_COOKIE, cookie)],
            Json(json!({ "ok": true, "redirect": "/admin" })),
        )
            .into_response(),
    };
    Ok(response)
}

/// Drops the session, if any, and always clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(session) =
        read_cookie(&headers, SESSION_COOKIE).and_then(|token| state.sessions.destroy(token))
    {
        tracing::info!(session_secs = session.age().as_secs(), "Admin logged out");
    }
    (
        [(SET_COOKIE, clear_session_cookie(state.config.session.secure_cookie))],
        Json(json!({ "ok": true })),
    )
}

pub async fn panel(_: PanelSession) -> Html<&'static str> {
    Html(ADMIN_PAGE)
}

pub async fn list(_: AdminSession, State(state): State<AppState>) -> Json<ListResponseDto> {
    let items = state
        .store
        .list()
        .await
        .into_iter()
        .map(|(device, record)| DeviceItemDto { device, record })
        .collect();
    Json(ListResponseDto { ok: true, items })
}

pub async fn save(
    _: AdminSession,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SaveDeviceBodyDto>,
) -> ApiResult<Json<SaveResponseDto>> {
    let (device, data) = super::device::save_record(&state, body).await?;
    Ok(Json(SaveResponseDto {
        ok: true,
        device,
        data,
    }))
}

pub async fn delete(
    _: AdminSession,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<DeleteDeviceBodyDto>,
) -> ApiResult<Json<serde_json::Value>> {
    let code = body
        .device
        .as_deref()
        .and_then(DeviceCode::parse)
        .ok_or(ApiError::MissingDevice)?;
    if state.store.delete(&code).await? {
        tracing::info!(device = %code, "Device record deleted");
    }
    Ok(Json(json!({ "ok": true })))
}
