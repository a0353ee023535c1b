//! 역할별 대시보드 endpoint.
//!
//! 각 영역은 해당 역할 게이트 뒤에 마운트되며, 핸들러는 미들웨어가 첨부한
//! 주체만 사용합니다.

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::Authenticated;
use crate::state::AppState;
use portal_core::{auth_span, Principal};

/// 대시보드 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// 영역 이름 ("admin" | "instructor" | "learner")
    pub area: String,
    /// 인사말
    pub greeting: String,
    /// 요청 주체
    pub principal: Principal,
}

fn dashboard(area: &str, auth: Authenticated) -> Json<DashboardResponse> {
    let _span = auth_span!("dashboard", auth.principal, area).entered();
    tracing::debug!("Serving dashboard");

    Json(DashboardResponse {
        area: area.to_string(),
        greeting: format!("안녕하세요, {}님", auth.principal.display_name),
        principal: auth.principal,
    })
}

/// GET /api/admin/dashboard
pub async fn admin_dashboard(auth: Authenticated) -> Json<DashboardResponse> {
    dashboard("admin", auth)
}

/// GET /api/instructor/dashboard
pub async fn instructor_dashboard(auth: Authenticated) -> Json<DashboardResponse> {
    dashboard("instructor", auth)
}

/// GET /api/learner/dashboard
pub async fn learner_dashboard(auth: Authenticated) -> Json<DashboardResponse> {
    dashboard("learner", auth)
}

/// 관리자 영역 라우터.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(admin_dashboard))
}

/// 강사 영역 라우터.
pub fn instructor_router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(instructor_dashboard))
}

/// 학습자 영역 라우터.
pub fn learner_router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(learner_dashboard))
}
