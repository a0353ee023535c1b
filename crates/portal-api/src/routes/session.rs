//! 세션 확인 endpoint.
//!
//! 클라이언트 세션 저장소가 보관 중인 토큰을 서버 측 코덱으로 재검증할 때
//! 사용합니다.

use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::Authenticated;
use crate::state::AppState;
use portal_core::Principal;

/// 세션 확인 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// 토큰에서 도출된 주체
    pub principal: Principal,
    /// 토큰 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl From<Authenticated> for SessionResponse {
    fn from(auth: Authenticated) -> Self {
        Self {
            principal: auth.principal,
            expires_at: auth.expires_at,
        }
    }
}

/// 현재 토큰의 주체 반환.
///
/// GET /api/auth/session
pub async fn current_session(auth: Authenticated) -> Json<SessionResponse> {
    Json(auth.into())
}

/// 세션 라우터. 인증 게이트는 호출 측에서 적용합니다.
pub fn session_router() -> Router<Arc<AppState>> {
    Router::new().route("/session", get(current_session))
}
