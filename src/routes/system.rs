use axum::http::StatusCode;
use axum::response::IntoResponse;

pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn version() -> impl IntoResponse {
    format!("devicegate_{}", env!("CARGO_PKG_VERSION"))
}
