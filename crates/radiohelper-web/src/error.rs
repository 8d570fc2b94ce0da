//! HTTP错误映射

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use radiohelper_core::RadioError;
use serde_json::json;
use tracing::{error, warn};

/// 处理器错误，包装 [`RadioError`] 并映射为状态码和 `{"error": ...}` 响应体
#[derive(Debug)]
pub struct ApiError(pub RadioError);

impl From<RadioError> for ApiError {
    fn from(err: RadioError) -> Self {
        Self(err)
    }
}

/// 请求体无法解析时同样返回 400 和 JSON 错误体
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RadioError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RadioError::EmptyInput
            | RadioError::InvalidNumber(_)
            | RadioError::NonPositiveValue(_)
            | RadioError::UnknownCoefficient { .. }
            | RadioError::Validation(_)
            | RadioError::Config(_) => StatusCode::BAD_REQUEST,
            RadioError::NotFound(_) => StatusCode::NOT_FOUND,
            RadioError::Conflict(_) => StatusCode::CONFLICT,
            RadioError::Unauthorized | RadioError::Collaborator(_) => StatusCode::BAD_GATEWAY,
            RadioError::Io(_) | RadioError::Serialization(_) | RadioError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
