use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ApiError {
    MissingDeviceCode,
    MissingDevice,
    BadRequest(anyhow::Error),
    /// bearer key missing or wrong
    Unauthorized,
    /// no valid panel session
    NotAuthenticated,
    InvalidCredentials,
    Internal(anyhow::Error),
}

impl ApiError {
    /// Machine readable code sent in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingDeviceCode => "missing_device_code",
            ApiError::MissingDevice => "missing_device",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotAuthenticated => "not_authenticated",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingDeviceCode | ApiError::MissingDevice | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::NotAuthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MissingDeviceCode => f.write_str("Query field 'device' is missing."),
            ApiError::MissingDevice => f.write_str("Body field 'device' is missing."),
            ApiError::BadRequest(error) => write!(f, "{error}"),
            ApiError::Unauthorized => f.write_str("Access denied: invalid admin key."),
            ApiError::NotAuthenticated => f.write_str("Access denied: no valid admin session."),
            ApiError::InvalidCredentials => f.write_str("Invalid username or password."),
            ApiError::Internal(_) => {
                write!(f, "An internal error occurred. Please try again later.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(err) => {
                tracing::error!("{:?}", self);
                err.chain()
                    .skip(1)
                    .for_each(|cause| tracing::error!("Because: {}", cause));
            }
            _ => tracing::debug!("{}", self),
        }
        (status, Json(json!({ "ok": false, "error": self.code() }))).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(value: E) -> Self {
        Self::Internal(value.into())
    }
}
