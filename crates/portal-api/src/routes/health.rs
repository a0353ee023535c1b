//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템에서 사용하는 공개 엔드포인트입니다.
//! 인증 게이트 바깥에 마운트됩니다.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use portal_core::ClaimsCodec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded" | "unhealthy")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 토큰 코덱 상태
    pub token_codec: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "degraded" | "down")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn new(status: &str, message: Option<String>) -> Self {
        Self {
            status: status.to_string(),
            message,
        }
    }
}

/// 코덱 상태를 점검합니다.
///
/// 자체 서명/검증이 실패하면 보호 라우트가 모두 401을 반환하게 되므로 `down`,
/// 시크릿이 권장 길이보다 짧으면 `degraded`입니다.
fn check_token_codec(codec: &ClaimsCodec) -> ComponentStatus {
    if let Err(e) = codec.self_check() {
        warn!(error = %e, "Token codec self-check failed");
        return ComponentStatus::new("down", Some(e.to_string()));
    }
    if codec.has_weak_secret() {
        return ComponentStatus::new("degraded", Some("JWT secret is shorter than 32 bytes".into()));
    }
    ComponentStatus::new("up", codec.issuer().map(|issuer| format!("issuer: {}", issuer)))
}

/// 간단한 헬스 체크 (liveness 확인용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness 확인용).
///
/// GET /health/ready. 코덱이 `down`이면 503을 반환합니다.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let token_codec = check_token_codec(&state.codec);
    let (status_code, status) = match token_codec.status.as_str() {
        "down" => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        "degraded" => (StatusCode::OK, "degraded"),
        _ => (StatusCode::OK, "healthy"),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth { token_codec },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use portal_core::AuthConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let app = Router::new().route("/health", get(health_check));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_returns_json() {
        use crate::state::create_test_state;

        let state = Arc::new(create_test_state());
        let app = Router::new()
            .route("/health/ready", get(health_ready))
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.components.token_codec.status, "up");
    }

    #[test]
    fn test_token_codec_component() {
        let issuing = ClaimsCodec::new(
            &AuthConfig::new("test-secret-key-for-jwt-testing-minimum-32-chars")
                .with_issuer("campus-portal"),
        )
        .unwrap();
        let up = check_token_codec(&issuing);
        assert_eq!(up.status, "up");
        assert_eq!(up.message.as_deref(), Some("issuer: campus-portal"));

        let weak = ClaimsCodec::new(&AuthConfig::new("short-secret")).unwrap();
        assert_eq!(check_token_codec(&weak).status, "degraded");
    }

    #[tokio::test]
    async fn test_health_ready_reports_weak_secret() {
        let codec = ClaimsCodec::new(&AuthConfig::new("short-secret")).unwrap();
        let app = Router::new()
            .route("/health/ready", get(health_ready))
            .with_state(Arc::new(AppState::new(codec)));

        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "degraded");
    }
}
