//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.
//! 요청 간 가변 상태는 없습니다.

use portal_core::{AuthConfig, ClaimsCodec, CodecError};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 토큰 검증 코덱 - 모든 보호 라우트의 미들웨어가 공유
    pub codec: ClaimsCodec,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(codec: ClaimsCodec) -> Self {
        Self {
            codec,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 인증 설정에서 AppState 생성.
    ///
    /// # Errors
    /// 시크릿이 비어 있으면 `CodecError::MissingSecret`을 반환합니다.
    pub fn from_auth_config(config: &AuthConfig) -> Result<Self, CodecError> {
        Ok(Self::new(ClaimsCodec::new(config)?))
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 시크릿.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    AppState::from_auth_config(&AuthConfig::new(TEST_SECRET))
        .expect("test secret is non-empty")
}
