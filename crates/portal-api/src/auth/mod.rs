//! 인증 및 권한 부여.
//!
//! Bearer 토큰 검증과 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`authorize`]: `(헤더, 코덱, 허용 역할) -> 결과`의 순수 검증 함수
//! - [`require_roles`]: 라우터에 붙이는 Axum 미들웨어
//! - [`AuthGate`]: 미들웨어 설정 (코덱 + 허용 역할 집합)
//! - [`Authenticated`]: 검증된 주체 추출기
//! - [`AuthRejection`]: 401/403 응답으로 변환되는 거부
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let admin_only = AuthGate::new(state.codec.clone(), RoleSet::of(&[Role::Admin]));
//! let router = Router::new()
//!     .route("/api/admin/dashboard", get(handler))
//!     .route_layer(middleware::from_fn_with_state(admin_only, require_roles));
//!
//! async fn handler(auth: Authenticated) -> impl IntoResponse {
//!     format!("Hello, {}!", auth.principal.display_name)
//! }
//! ```

mod middleware;

pub use middleware::{authorize, bearer_token, require_roles, AuthGate, AuthRejection, Authenticated};
