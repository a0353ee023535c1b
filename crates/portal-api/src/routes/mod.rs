//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness, 공개)
//! - `/health/ready` - 상세 헬스 체크 (readiness, 공개)
//! - `/api/auth/session` - 현재 토큰의 주체 (인증된 누구나)
//! - `/api/admin/*` - 관리자 전용
//! - `/api/instructor/*` - 관리자, 강사
//! - `/api/learner/*` - 학습자 전용
//!
//! 각 보호 서브트리는 독립적으로 설정된 [`AuthGate`]를 `route_layer`로 가집니다.

pub mod dashboards;
pub mod health;
pub mod session;

pub use dashboards::{admin_router, instructor_router, learner_router, DashboardResponse};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use session::{session_router, SessionResponse};

use axum::{middleware, Router};
use portal_core::{Role, RoleSet};
use std::sync::Arc;

use crate::auth::{require_roles, AuthGate};
use crate::state::AppState;

/// 관리자 영역 허용 역할.
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];
/// 강사 영역 허용 역할.
pub const INSTRUCTOR_ROLES: &[Role] = &[Role::Admin, Role::Instructor];
/// 학습자 영역 허용 역할.
pub const LEARNER_ROLES: &[Role] = &[Role::Learner];

/// 서브 라우터에 역할 게이트를 적용합니다.
///
/// `route_layer`를 사용하므로 매칭되지 않는 경로는 인증 전에 404가 됩니다.
pub fn guarded(router: Router<Arc<AppState>>, state: &AppState, allowed: RoleSet) -> Router<Arc<AppState>> {
    let gate = AuthGate::new(state.codec.clone(), allowed);
    router.route_layer(middleware::from_fn_with_state(gate, require_roles))
}

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 상태가 주입된 라우터로 반환합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health_router())
        .nest(
            "/api/auth",
            guarded(session_router(), &state, RoleSet::any()),
        )
        .nest(
            "/api/admin",
            guarded(admin_router(), &state, RoleSet::of(ADMIN_ROLES)),
        )
        .nest(
            "/api/instructor",
            guarded(instructor_router(), &state, RoleSet::of(INSTRUCTOR_ROLES)),
        )
        .nest(
            "/api/learner",
            guarded(learner_router(), &state, RoleSet::of(LEARNER_ROLES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::Duration;
    use portal_core::{Claims, Principal};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(create_test_state());
        (create_api_router(state.clone()), state)
    }

    fn token(state: &AppState, role: Role, ttl: Duration) -> String {
        let principal = Principal {
            id: format!("{}-100", role),
            display_name: format!("{} user", role),
            email: format!("{}@campus.test", role),
            role,
            profile_image: None,
            preferences: None,
        };
        state.codec.encode(&Claims::new(&principal, ttl)).unwrap()
    }

    fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = app();
        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let (app, _) = app();
        let response = app.oneshot(get("/api/admin/dashboard", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], "MISSING_TOKEN");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_expired_token_is_401_for_admin() {
        let (app, state) = app();
        let expired = token(&state, Role::Admin, Duration::minutes(-1));

        let response = app
            .oneshot(get("/api/admin/dashboard", Some(&expired)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_learner_on_admin_route_is_403() {
        let (app, state) = app();
        let learner = token(&state, Role::Learner, Duration::minutes(10));

        let response = app
            .oneshot(get("/api/admin/dashboard", Some(&learner)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_admin_on_admin_route_receives_principal() {
        let (app, state) = app();
        let admin = token(&state, Role::Admin, Duration::minutes(10));

        let response = app
            .oneshot(get("/api/admin/dashboard", Some(&admin)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["area"], "admin");
        assert_eq!(body["principal"]["id"], "admin-100");
        assert_eq!(body["principal"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_session_accepts_any_role() {
        for role in Role::ALL {
            let (app, state) = app();
            let bearer = token(&state, role, Duration::minutes(10));

            let response = app
                .oneshot(get("/api/auth/session", Some(&bearer)))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body["principal"]["role"], role.as_str());
            assert!(body["expires_at"].is_string());
        }
    }

    #[tokio::test]
    async fn test_access_matrix() {
        let areas = [
            ("/api/admin/dashboard", ADMIN_ROLES),
            ("/api/instructor/dashboard", INSTRUCTOR_ROLES),
            ("/api/learner/dashboard", LEARNER_ROLES),
        ];

        for (uri, allowed) in areas {
            for role in Role::ALL {
                let (app, state) = app();
                let bearer = token(&state, role, Duration::minutes(10));
                let response = app.oneshot(get(uri, Some(&bearer))).await.unwrap();

                let expected = if allowed.contains(&role) {
                    StatusCode::OK
                } else {
                    StatusCode::FORBIDDEN
                };
                assert_eq!(response.status(), expected, "{} as {}", uri, role);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_without_auth() {
        let (app, _) = app();
        let response = app.oneshot(get("/api/admin/nothing-here", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
