use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::database::store::StoreError;
use crate::utils::{error_codes, error_to_api_response};

/// 登记流程的错误分类。
/// "未找到匹配" 不是错误，由 `Option<MatchResult>` 表达。
#[derive(Debug, Error)]
pub enum RideError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("registration failed: {0}")]
    Persistence(#[from] StoreError),
}

impl IntoResponse for RideError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            RideError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            RideError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        };

        let body = error_to_api_response::<()>(code, self.to_string());
        (status, body).into_response()
    }
}
