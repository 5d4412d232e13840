use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::presence::StoreError;
use crate::utils::error_codes;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    UnknownUser(String),
    BadRequest(String),
    InternalServerError,
}

#[derive(Serialize)]
struct ErrorResponse {
    code: i32,
    error_message: String,
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadAuth => AppError::Unauthorized,
            StoreError::UnknownKey(key) => AppError::UnknownUser(key),
            StoreError::Persistence(e) => {
                tracing::error!("Presence persistence failed: {}", e);
                AppError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                error_codes::AUTH_FAILED,
                "密钥错误".to_string(),
            ),
            AppError::UnknownUser(key) => (
                StatusCode::BAD_REQUEST,
                error_codes::UNKNOWN_USER,
                format!("无效的用户ID: {}", key),
            ),
            AppError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                error_codes::VALIDATION_ERROR,
                reason,
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "内部服务器错误".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            code,
            error_message,
        });

        (status, body).into_response()
    }
}
