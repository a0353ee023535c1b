//! 라우트 가드.
//!
//! 요구 역할 집합과 현재 세션으로 보호 화면의 렌더링 여부를 결정합니다.
//! 결정은 세션 스냅샷에 대한 순수 함수이며, 하나의 [`SessionStore`] 아래
//! 독립적으로 설정된 가드를 중첩할 수 있습니다.

use portal_core::{ClientConfig, Role, RoleSet};

use crate::session::{Session, SessionStatus, SessionStore};

/// 리다이렉트 대상.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Redirect {
    /// 로그인 진입점
    Login,
    /// 권한 없음 페이지
    Unauthorized,
}

impl Redirect {
    /// 설정된 경로.
    pub fn path<'a>(&self, config: &'a ClientConfig) -> &'a str {
        match self {
            Redirect::Login => &config.login_path,
            Redirect::Unauthorized => &config.unauthorized_path,
        }
    }
}

/// 가드 결정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardDecision {
    /// 세션 미결정. 중립 대기 화면을 보이고 리다이렉트하지 않음
    Wait,
    /// 하이드레이션 실패 (재시도 가능). 리다이렉트하지 않음
    Retry,
    /// 다른 화면으로 이동
    Redirect(Redirect),
    /// 보호 화면 렌더링
    Render,
}

impl GuardDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardDecision::Redirect(_))
    }
}

/// 요구 역할 집합으로 구성된 가드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteGuard {
    required: RoleSet,
}

impl RouteGuard {
    pub fn new(required: RoleSet) -> Self {
        Self { required }
    }

    /// 인증된 주체라면 누구나 통과.
    pub fn authenticated() -> Self {
        Self::new(RoleSet::any())
    }

    pub fn for_roles(roles: &[Role]) -> Self {
        Self::new(RoleSet::of(roles))
    }

    pub fn required(&self) -> RoleSet {
        self.required
    }

    /// 세션 값에 대한 결정.
    pub fn decide(&self, session: &Session) -> GuardDecision {
        match session.status() {
            SessionStatus::Hydrating => GuardDecision::Wait,
            SessionStatus::Unavailable => GuardDecision::Retry,
            SessionStatus::Anonymous | SessionStatus::Expired => {
                GuardDecision::Redirect(Redirect::Login)
            }
            SessionStatus::Authenticated => match session.role() {
                Some(role) if self.required.permits(role) => GuardDecision::Render,
                Some(_) => GuardDecision::Redirect(Redirect::Unauthorized),
                None => GuardDecision::Redirect(Redirect::Login),
            },
        }
    }

    /// 저장소의 현재 스냅샷으로 결정.
    pub fn check(&self, store: &SessionStore) -> GuardDecision {
        self.decide(&store.snapshot())
    }
}

/// 경로 접두사별 가드 트리.
///
/// 경로를 덮는 모든 가드를 바깥(짧은 접두사)부터 평가하고, 처음으로
/// `Render`가 아닌 결정이 최종 결정입니다. 어떤 가드도 덮지 않는 경로는 공개입니다.
#[derive(Debug, Clone, Default)]
pub struct GuardedRoutes {
    routes: Vec<(String, RouteGuard)>,
}

impl GuardedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 접두사에 가드 추가.
    #[must_use]
    pub fn guard(mut self, prefix: impl Into<String>, guard: RouteGuard) -> Self {
        let prefix = normalize(&prefix.into());
        self.routes.push((prefix, guard));
        self.routes
            .sort_by_key(|(prefix, _)| prefix.split('/').filter(|s| !s.is_empty()).count());
        self
    }

    /// 경로를 덮는 가드들 (바깥부터).
    pub fn guards_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a RouteGuard> + 'a {
        let path = normalize(path);
        self.routes
            .iter()
            .filter(move |(prefix, _)| covers(prefix, &path))
            .map(|(_, guard)| guard)
    }

    /// 세션 값에 대한 경로 결정.
    pub fn decide(&self, path: &str, session: &Session) -> GuardDecision {
        self.guards_for(path)
            .map(|guard| guard.decide(session))
            .find(|decision| *decision != GuardDecision::Render)
            .unwrap_or(GuardDecision::Render)
    }

    /// 저장소의 현재 스냅샷으로 경로 결정.
    pub fn check(&self, path: &str, store: &SessionStore) -> GuardDecision {
        self.decide(path, &store.snapshot())
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// 세그먼트 경계 기준 접두사 매칭 (`/admin`은 `/administrator`를 덮지 않음).
fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
