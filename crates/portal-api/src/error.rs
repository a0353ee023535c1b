//! API 에러 응답 본문.
//!
//! 401/403 거부는 모두 이 형식으로 직렬화되며, 클라이언트는 `code`로 거부
//! 사유를 복원합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API 에러 응답.
///
/// ```json
/// {
///   "code": "TOKEN_EXPIRED",
///   "message": "유효하지 않은 토큰: 토큰이 만료되었습니다"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "MISSING_TOKEN", "FORBIDDEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 상태 코드와 함께 응답으로 변환.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
