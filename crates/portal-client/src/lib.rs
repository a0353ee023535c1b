//! # Portal Client
//!
//! 클라이언트 측 인증 상태를 관리합니다.
//!
//! - [`SessionStore`]: 현재 로그인한 주체에 대한 단일 진실 공급원.
//!   영속 저장소에서 하이드레이션하고, 로그인/로그아웃/강제 만료로 변경되며,
//!   모든 보호 화면이 구독합니다.
//! - [`RouteGuard`], [`GuardedRoutes`]: 세션 상태와 요구 역할로 렌더링/리다이렉트를
//!   결정하는 선언적 게이트.
//! - [`ApiClient`]: Bearer 토큰을 첨부하고 서버 거부를 세션 저장소로 되돌려 보내는
//!   HTTP 클라이언트.
//!
//! 세션 저장소는 전역 싱글톤이 아니라 주입 가능한 객체이며, 가드와 API 클라이언트에
//! `Arc`로 전달됩니다.
//!
//! # 예제
//!
//! ```no_run
//! use std::sync::Arc;
//! use portal_client::{GuardDecision, MemoryTokenStorage, RemoteVerifier, RouteGuard, SessionStore};
//! use portal_core::Role;
//!
//! # async fn run() {
//! let verifier = RemoteVerifier::new("http://127.0.0.1:3000").unwrap();
//! let store = Arc::new(SessionStore::new(
//!     Arc::new(MemoryTokenStorage::new()),
//!     Arc::new(verifier),
//! ));
//!
//! store.hydrate().await;
//!
//! let guard = RouteGuard::for_roles(&[Role::Admin]);
//! match guard.check(&store) {
//!     GuardDecision::Render => println!("render admin view"),
//!     other => println!("not rendering: {:?}", other),
//! }
//! # }
//! ```

pub mod client;
pub mod guard;
pub mod session;
pub mod storage;
pub mod verifier;

pub use client::{ApiClient, ClientError};
pub use guard::{GuardDecision, GuardedRoutes, Redirect, RouteGuard};
pub use session::{Session, SessionError, SessionStatus, SessionStore};
pub use storage::{FileTokenStorage, MemoryTokenStorage, StorageError, TokenStorage, TOKEN_KEY};
pub use verifier::{LocalVerifier, RemoteVerifier, TokenVerifier, VerifiedSession};
