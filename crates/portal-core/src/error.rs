//! 인증 실패 분류.
//!
//! 서버 미들웨어, 클라이언트 세션 저장소, 라우트 가드가 공유하는
//! 단일 실패 분류입니다.

use thiserror::Error;

/// 토큰 디코딩 실패 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("잘못된 토큰 형식")]
    Malformed,
    #[error("토큰 서명이 유효하지 않습니다")]
    BadSignature,
}

/// 인증/인가 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Authorization 헤더가 없거나 Bearer 토큰이 아님
    #[error("인증 토큰이 필요합니다")]
    MissingToken,

    /// 토큰 검증 실패 (만료, 형식 오류, 서명 불일치)
    #[error("유효하지 않은 토큰: {0}")]
    InvalidToken(#[from] DecodeError),

    /// 역할 불일치
    #[error("접근 권한이 없습니다")]
    Forbidden,

    /// 세션 하이드레이션 또는 프로필 갱신 중 네트워크 장애
    #[error("네트워크 에러: {0}")]
    NetworkFailure(String),
}

impl AuthError {
    /// 와이어 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken(DecodeError::Expired) => "TOKEN_EXPIRED",
            AuthError::InvalidToken(DecodeError::Malformed) => "MALFORMED_TOKEN",
            AuthError::InvalidToken(DecodeError::BadSignature) => "BAD_SIGNATURE",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NetworkFailure(_) => "NETWORK_FAILURE",
        }
    }

    /// 대응하는 HTTP 상태 코드. 네트워크 장애는 서버 응답이 아니므로 `None`.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken(_) => Some(401),
            AuthError::Forbidden => Some(403),
            AuthError::NetworkFailure(_) => None,
        }
    }

    /// 세션을 폐기하고 로그인으로 보내야 하는 에러인지 확인.
    pub fn requires_login(&self) -> bool {
        matches!(self, AuthError::MissingToken | AuthError::InvalidToken(_))
    }

    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::NetworkFailure(_))
    }

    /// 서버 거부 응답(상태 코드 + 에러 코드)에서 에러를 복원합니다.
    ///
    /// 401/403이 아닌 상태는 `None`을 반환합니다. 알 수 없는 401 코드는
    /// 형식 오류 토큰으로 취급합니다.
    pub fn from_rejection(status: u16, code: Option<&str>) -> Option<Self> {
        match status {
            401 => Some(match code {
                Some("MISSING_TOKEN") => AuthError::MissingToken,
                Some("TOKEN_EXPIRED") => AuthError::InvalidToken(DecodeError::Expired),
                Some("BAD_SIGNATURE") => AuthError::InvalidToken(DecodeError::BadSignature),
                _ => AuthError::InvalidToken(DecodeError::Malformed),
            }),
            403 => Some(AuthError::Forbidden),
            _ => None,
        }
    }
}
