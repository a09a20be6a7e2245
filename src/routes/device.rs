use crate::common::{ApiError, ApiResult};
use crate::extractors::{ApiKey, JsonBody};
use crate::models::dtos::device::{
    CheckQueryDto, CheckResponseDto, SaveDeviceBodyDto, UpdateResponseDto,
};
use crate::models::{DeviceCode, DeviceRecord};
use crate::services::status;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};

/// Public activation check, no credentials required.
pub async fn check(
    State(state): State<AppState>,
    Query(query): Query<CheckQueryDto>,
) -> ApiResult<Json<CheckResponseDto>> {
    let code = query
        .device
        .as_deref()
        .and_then(DeviceCode::parse)
        .ok_or(ApiError::MissingDeviceCode)?;
    let record = state.store.get(&code).await;
    let status = status::evaluate(record.as_ref(), chrono::Utc::now());
    let record = record.unwrap_or_default();
    Ok(Json(CheckResponseDto {
        ok: true,
        device_code: code,
        status,
        plan: record.plan,
        expiry: record.expiry,
        notes: record.notes,
    }))
}

/// Scripted upsert guarded by the admin key.
pub async fn update(
    _: ApiKey,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SaveDeviceBodyDto>,
) -> ApiResult<Json<UpdateResponseDto>> {
    let (device_code, data) = save_record(&state, body).await?;
    Ok(Json(UpdateResponseDto {
        ok: true,
        device_code,
        data,
    }))
}

pub(super) async fn save_record(
    state: &AppState,
    body: SaveDeviceBodyDto,
) -> ApiResult<(DeviceCode, DeviceRecord)> {
    let (code, record) = body.into_parts();
    let code = code.ok_or(ApiError::MissingDevice)?;
    let stored = state.store.put(code.clone(), record).await?;
    tracing::info!(device = %code, status = %stored.status, "Device record saved");
    Ok((code, stored))
}
