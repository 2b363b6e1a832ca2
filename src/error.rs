use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ContractKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} contract not deployed yet")]
    ContractNotConfigured(ContractKind),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    #[error("Invalid signature")]
    SignatureMismatch,

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ContractNotConfigured(_) => {
                (StatusCode::BAD_REQUEST, "CONTRACT_NOT_CONFIGURED")
            }
            AppError::InvalidAddress(_) => (StatusCode::BAD_REQUEST, "INVALID_ADDRESS"),
            AppError::RemoteCallFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REMOTE_CALL_FAILED")
            }
            AppError::SignatureMismatch => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            AppError::AuthError(_) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
