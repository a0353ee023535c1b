//! 요청 명령 (get, guard).

use anyhow::Result;
use portal_client::{ClientError, GuardedRoutes, RouteGuard};
use portal_core::Role;
use serde_json::Value;
use tracing::warn;

use super::output::render_decision;
use super::CliContext;

/// 포털 화면 트리의 가드 구성.
pub fn portal_routes() -> GuardedRoutes {
    GuardedRoutes::new()
        .guard("/admin", RouteGuard::for_roles(&[Role::Admin]))
        .guard("/instructor", RouteGuard::for_roles(&[Role::Admin, Role::Instructor]))
        .guard("/learner", RouteGuard::for_roles(&[Role::Learner]))
        .guard("/profile", RouteGuard::authenticated())
}

/// 인증된 GET 요청을 보내고 응답 본문을 출력합니다.
///
/// 거부 응답은 세션에 반영되며, 리다이렉트 대상을 에러 메시지에 포함합니다.
pub async fn get(ctx: &CliContext, path: &str) -> Result<String> {
    ctx.store.hydrate().await;

    match ctx.client.get::<Value>(path).await {
        Ok(body) => Ok(serde_json::to_string_pretty(&body)?),
        Err(err @ ClientError::Rejected { .. }) => {
            let target = err
                .redirect()
                .map(|r| r.path(&ctx.config).to_string())
                .unwrap_or_default();
            warn!(error = %err, "Request rejected");
            Err(anyhow::anyhow!("{} (이동: {})", err, target))
        }
        Err(err) => Err(err.into()),
    }
}

/// 화면 경로에 대한 가드 결정을 출력합니다.
pub async fn guard(ctx: &CliContext, path: &str) -> String {
    ctx.store.hydrate().await;
    let decision = portal_routes().check(path, &ctx.store);
    render_decision(path, decision, &ctx.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_client::{GuardDecision, LocalVerifier, MemoryTokenStorage, Redirect, Session, SessionStore};
    use portal_core::{AuthConfig, Claims, ClaimsCodec, ClientConfig, Principal};
    use std::sync::Arc;

    const SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    #[test]
    fn test_portal_routes() {
        let routes = portal_routes();
        assert_eq!(
            routes.decide("/admin/users", &Session::anonymous()),
            GuardDecision::Redirect(Redirect::Login)
        );
        assert_eq!(routes.decide("/about", &Session::anonymous()), GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_guard_command_for_learner() {
        let codec = ClaimsCodec::new(&AuthConfig::new(SECRET)).unwrap();
        let principal = Principal {
            id: "learner-9".to_string(),
            display_name: "Jung".to_string(),
            email: "jung@campus.test".to_string(),
            role: Role::Learner,
            profile_image: None,
            preferences: None,
        };
        let token = codec
            .encode(&Claims::new(&principal, chrono::Duration::minutes(10)))
            .unwrap();

        let store = Arc::new(SessionStore::new(
            Arc::new(MemoryTokenStorage::with_token(token)),
            Arc::new(LocalVerifier::new(codec)),
        ));
        let ctx = CliContext::with_store(ClientConfig::default(), store).unwrap();

        assert!(guard(&ctx, "/learner/courses").await.contains("렌더링"));
        assert!(guard(&ctx, "/admin").await.contains("/unauthorized"));
    }
}
