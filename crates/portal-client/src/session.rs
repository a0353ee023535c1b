//! 세션 저장소.
//!
//! 클라이언트에서 "누가 로그인해 있는가"에 대한 단일 진실 공급원입니다.
//!
//! # 상태 전이
//!
//! ```text
//! 생성 ──> Hydrating ──┬──> Authenticated   (저장된 토큰이 검증됨)
//!                      ├──> Anonymous       (토큰 없음, 또는 무효/만료 → 삭제)
//!                      └──> Unavailable     (네트워크 장애/타임아웃, 토큰 유지)
//!
//! Anonymous     ──login──────────────> Authenticated
//! Authenticated ──logout / 서버 401──> Anonymous
//! Authenticated ──update_profile─────> Authenticated
//! Authenticated ──만료 시각 경과──────> Expired
//! Unavailable   ──retry_hydration────> (Hydrating과 동일한 결과)
//! ```
//!
//! 모든 이벤트는 epoch를 증가시키고, 비동기 작업은 시작 시점의 epoch가 여전히
//! 최신일 때만 결과를 반영합니다. 로그인 직후 로그아웃처럼 빠르게 이어진 이벤트에서
//! 마지막 이벤트가 항상 이깁니다.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use portal_core::{AuthError, ClaimsCodec, ClaimsPreview, Principal, ProfileUpdate, Role};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::guard::Redirect;
use crate::storage::{StorageError, TokenStorage};
use crate::verifier::{TokenVerifier, VerifiedSession};

/// 기본 하이드레이션/검증 타임아웃.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// 세션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// 로그인하지 않음
    Anonymous,
    /// 저장된 토큰을 검증 중 (미결정)
    Hydrating,
    /// 검증된 주체 보유
    Authenticated,
    /// 보유 중이던 토큰의 만료 시각이 지남
    Expired,
    /// 하이드레이션 중 네트워크 장애 (재시도 가능)
    Unavailable,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Anonymous => "anonymous",
            SessionStatus::Hydrating => "hydrating",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Expired => "expired",
            SessionStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 클라이언트가 현재 믿고 있는 로그인 상태.
///
/// 필드는 비공개이며 이름 있는 생성자로만 만들어지므로, 주체는
/// `Authenticated` 상태에서만 존재합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    status: SessionStatus,
    principal: Option<Principal>,
    expires_at: Option<DateTime<Utc>>,
    error: Option<AuthError>,
    preview: Option<ClaimsPreview>,
}

impl Session {
    /// 하이드레이션 대기 상태. 미리보기는 이름 표시용입니다.
    pub fn hydrating(preview: Option<ClaimsPreview>) -> Self {
        Self {
            status: SessionStatus::Hydrating,
            principal: None,
            expires_at: None,
            error: None,
            preview,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            status: SessionStatus::Anonymous,
            principal: None,
            expires_at: None,
            error: None,
            preview: None,
        }
    }

    /// 거부 사유가 기록된 익명 상태.
    pub fn anonymous_with(error: AuthError) -> Self {
        Self {
            error: Some(error),
            ..Self::anonymous()
        }
    }

    pub fn authenticated(principal: Principal, expires_at: DateTime<Utc>) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            principal: Some(principal),
            expires_at: Some(expires_at),
            error: None,
            preview: None,
        }
    }

    pub fn expired() -> Self {
        Self {
            status: SessionStatus::Expired,
            ..Self::anonymous()
        }
    }

    pub fn unavailable(error: AuthError) -> Self {
        Self {
            status: SessionStatus::Unavailable,
            principal: None,
            expires_at: None,
            error: Some(error),
            preview: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.principal.as_ref().map(|p| p.role)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// 마지막 전이의 원인이 된 에러.
    pub fn error(&self) -> Option<&AuthError> {
        self.error.as_ref()
    }

    /// 검증되지 않은 토큰 미리보기 (하이드레이션 중에만 존재).
    pub fn preview(&self) -> Option<&ClaimsPreview> {
        self.preview.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// 인증 상태이지만 만료 시각이 지났는지 확인.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_authenticated() && self.expires_at.is_some_and(|exp| exp <= now)
    }

    fn with_preview(mut self, preview: Option<ClaimsPreview>) -> Self {
        self.preview = preview;
        self
    }
}

/// 세션 작업 에러.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// 더 새로운 이벤트가 이 작업을 대체함
    #[error("더 최근의 세션 이벤트로 작업이 취소되었습니다")]
    Superseded,

    #[error("인증된 세션이 없습니다")]
    NotAuthenticated,
}

/// epoch와 메모리 토큰. 항상 함께 변경됩니다.
#[derive(Debug, Default)]
struct Inner {
    epoch: u64,
    token: Option<String>,
    /// 메모리에서는 폐기됐지만 저장소에서 아직 지우지 못한 토큰이 있음
    purge_pending: bool,
}

impl Inner {
    /// 새 이벤트로 토큰을 폐기합니다. 저장소 삭제가 끝날 때까지 `purge_pending`이 유지됩니다.
    fn discard(&mut self) {
        self.epoch += 1;
        self.token = None;
        self.purge_pending = true;
    }
}

/// 세션 저장소.
///
/// `Arc`로 공유하여 라우트 가드와 API 클라이언트에 주입합니다. 생성 시 상태는
/// `Hydrating`이며, [`hydrate`](Self::hydrate)가 한 번 실행되어 결정됩니다.
///
/// 로그인, 로그아웃, 거부 반영, 만료 강등, 프로필 병합은 epoch를 증가시키는
/// 이벤트입니다. 하이드레이션과 프로필 갱신은 시작 시점의 epoch를 관찰만 하므로
/// 그 사이에 일어난 이벤트가 있으면 결과를 버립니다.
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    verifier: Arc<dyn TokenVerifier>,
    verify_timeout: Duration,
    inner: Mutex<Inner>,
    state: watch::Sender<Session>,
    /// 하이드레이션 완료 여부. 동시 호출은 이 잠금에서 대기합니다.
    hydration: tokio::sync::Mutex<bool>,
    /// 저장소 쓰기 직렬화
    persist: tokio::sync::Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>, verifier: Arc<dyn TokenVerifier>) -> Self {
        let (state, _) = watch::channel(Session::hydrating(None));
        Self {
            storage,
            verifier,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            inner: Mutex::new(Inner::default()),
            state,
            hydration: tokio::sync::Mutex::new(false),
            persist: tokio::sync::Mutex::new(()),
        }
    }

    /// 검증 타임아웃 설정. 이 시간 안에 응답이 없으면 네트워크 장애로 처리합니다.
    #[must_use]
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    /// 현재 세션 (동기 읽기).
    ///
    /// 보유 중인 주체의 만료 시각이 지났다면 `Expired`로 강등한 뒤 반환합니다.
    pub fn snapshot(&self) -> Session {
        let current = self.state.borrow().clone();
        if !current.is_overdue(Utc::now()) {
            return current;
        }

        let mut inner = self.lock_inner();
        // 잠금 획득 사이에 다른 이벤트가 상태를 바꿨을 수 있음
        if !self.state.borrow().is_overdue(Utc::now()) {
            return self.state.borrow().clone();
        }

        info!("Session expired, demoting");
        inner.discard();
        self.state.send_replace(Session::expired());
        Session::expired()
    }

    /// 세션 변경 구독.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// 현재 보유 중인 토큰.
    ///
    /// 만료 여부는 확인하지 않습니다. 만료 판단은 서버의 몫이며, 서버 401은
    /// [`handle_rejection`](Self::handle_rejection)으로 반영됩니다.
    pub fn token(&self) -> Option<String> {
        self.lock_inner().token.clone()
    }

    /// 저장소에서 지우지 못한 폐기 토큰이 남아 있는지 확인.
    pub fn purge_pending(&self) -> bool {
        self.lock_inner().purge_pending
    }

    /// 저장된 토큰으로 세션을 결정합니다.
    ///
    /// 애플리케이션 수명 동안 한 번만 검증을 수행하며, 동시 호출자는 같은 결과를
    /// 공유합니다. 이후 호출은 현재 세션을 반환합니다.
    pub async fn hydrate(&self) -> Session {
        self.ensure_hydrated().await;
        self.snapshot()
    }

    /// 하이드레이션이 끝날 때까지 기다립니다. 아직 시작되지 않았다면 실행합니다.
    ///
    /// [`hydrate`](Self::hydrate)와 달리 만료 강등을 일으키지 않습니다.
    pub(crate) async fn ensure_hydrated(&self) {
        let mut done = self.hydration.lock().await;
        if !*done {
            self.run_hydration().await;
            *done = true;
        }
    }

    /// `Unavailable` 상태에서 하이드레이션을 다시 실행합니다.
    ///
    /// 첫 하이드레이션 전이라면 하이드레이션을 실행하고, 그 외 상태에서는 현재
    /// 세션을 그대로 반환합니다.
    pub async fn retry_hydration(&self) -> Session {
        let mut done = self.hydration.lock().await;
        if *done && self.snapshot().status() != SessionStatus::Unavailable {
            return self.snapshot();
        }

        self.run_hydration().await;
        *done = true;
        self.snapshot()
    }

    async fn run_hydration(&self) {
        let epoch = self.current_epoch();
        self.flush_pending_purge().await;

        if self.purge_pending() {
            // 폐기된 토큰이 저장소에 남아 있으므로 복원하지 않음
            warn!("Discarded token is still persisted, skipping restore");
            self.commit(epoch, None, Session::anonymous());
            return;
        }

        let token = match self.storage.load().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No persisted token");
                self.commit(epoch, None, Session::anonymous());
                return;
            }
            Err(StorageError::Format(e)) => {
                warn!(error = %e, "Persisted session is corrupt, purging");
                let _ = self.purge_if_current(epoch, Session::anonymous()).await;
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to read persisted session");
                self.commit(epoch, None, Session::anonymous());
                return;
            }
        };

        let preview = ClaimsCodec::preview(&token).ok();
        self.publish_if_current(epoch, Session::hydrating(preview.clone()));

        match self.verify(&token).await {
            Ok(verified) if verified.expires_at > Utc::now() => {
                info!(
                    principal = %verified.principal.id,
                    role = %verified.principal.role,
                    "Session hydrated"
                );
                let session = Session::authenticated(verified.principal, verified.expires_at);
                self.commit(epoch, Some(token), session);
            }
            Ok(_) => {
                info!("Persisted token already expired, purging");
                let error = AuthError::InvalidToken(portal_core::DecodeError::Expired);
                let _ = self
                    .purge_if_current(epoch, Session::anonymous_with(error))
                    .await;
            }
            Err(error) if error.requires_login() => {
                info!(code = error.code(), "Persisted token rejected, purging");
                let _ = self
                    .purge_if_current(epoch, Session::anonymous_with(error))
                    .await;
            }
            Err(error) => {
                warn!(code = error.code(), error = %error, "Hydration unavailable");
                let session = Session::unavailable(error).with_preview(preview);
                self.commit(epoch, None, session);
            }
        }
    }

    /// 외부 로그인으로 발급된 토큰을 받아 세션을 시작합니다.
    ///
    /// 토큰은 검증 경로를 통과한 경우에만 저장되며, 그때 비로소 이벤트가 됩니다.
    /// 실패한 로그인은 세션과 진행 중인 하이드레이션에 영향을 주지 않습니다.
    pub async fn login(&self, token: &str) -> Result<Session, SessionError> {
        let observed = self.current_epoch();
        let verified = self.verify(token).await?;

        let _persist = self.persist.lock().await;
        if !self.is_current(observed) {
            debug!("Login superseded by a newer event");
            return Err(SessionError::Superseded);
        }

        self.storage.save(token).await?;

        let principal_id = verified.principal.id.clone();
        let session = Session::authenticated(verified.principal, verified.expires_at);
        {
            let mut inner = self.lock_inner();
            inner.epoch += 1;
            inner.token = Some(token.to_string());
            // 같은 키를 덮어썼으므로 이전 토큰은 더 이상 남아 있지 않음
            inner.purge_pending = false;
            self.state.send_replace(session.clone());
        }

        info!(principal = %principal_id, "Logged in");
        Ok(session)
    }

    /// 로그아웃. 토큰을 삭제하고 `Anonymous`로 전이합니다.
    ///
    /// 저장소 삭제에 실패하면 에러를 반환하지만 세션은 `Anonymous`로 남고,
    /// 삭제는 [`flush_pending_purge`](Self::flush_pending_purge)에서 재시도됩니다.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _persist = self.persist.lock().await;
        self.discard(Session::anonymous());

        self.clear_storage().await?;
        info!("Logged out");
        Ok(())
    }

    /// 보유 중인 주체에 부분 업데이트를 병합합니다. 토큰은 변경되지 않습니다.
    pub fn update_profile(&self, update: ProfileUpdate) -> Result<Session, SessionError> {
        let current = self.snapshot();
        let (Some(principal), Some(expires_at)) = (current.principal(), current.expires_at())
        else {
            return Err(SessionError::NotAuthenticated);
        };

        let mut merged = principal.clone();
        merged.merge(update);

        let mut inner = self.lock_inner();
        if !self.state.borrow().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        inner.epoch += 1;
        let session = Session::authenticated(merged, expires_at);
        self.state.send_replace(session.clone());
        debug!("Profile merged");
        Ok(session)
    }

    /// 보유 토큰을 다시 검증하여 최신 주체로 갱신합니다.
    ///
    /// 401 계열 거부는 로그아웃과 동일하게 처리되고, 네트워크 장애는 세션을
    /// 유지한 채 에러를 반환합니다.
    pub async fn refresh_profile(&self) -> Result<Session, SessionError> {
        if !self.snapshot().is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let Some(token) = self.token() else {
            return Err(SessionError::NotAuthenticated);
        };
        let epoch = self.current_epoch();

        match self.verify(&token).await {
            Ok(verified) => {
                let session = Session::authenticated(verified.principal, verified.expires_at);
                if self.commit(epoch, Some(token), session.clone()) {
                    debug!("Profile refreshed");
                    Ok(session)
                } else {
                    Err(SessionError::Superseded)
                }
            }
            Err(error) if error.requires_login() => {
                let _persist = self.persist.lock().await;
                if !self.is_current(epoch) {
                    return Err(SessionError::Superseded);
                }
                info!(code = error.code(), "Token rejected during refresh");
                self.discard(Session::anonymous_with(error.clone()));
                self.clear_storage().await?;
                Err(error.into())
            }
            Err(error) => {
                warn!(error = %error, "Profile refresh failed, keeping session");
                Err(error.into())
            }
        }
    }

    /// API 호출이 보고한 거부를 세션에 반영합니다.
    ///
    /// - `MissingToken`/`InvalidToken` → 토큰 삭제, `Anonymous`, 로그인 리다이렉트
    /// - `Forbidden` → 권한 없음 리다이렉트, 세션 유지
    /// - `NetworkFailure` → 변경 없음
    ///
    /// `sent_token`은 거부된 요청에 실린 토큰입니다. 다음 거부는 무시됩니다.
    /// - 그 사이 다른 토큰을 보유하게 된 경우
    /// - 세션이 아직 결정되지 않은 상태(`Hydrating`, `Unavailable`)에서 토큰 없이 보낸 요청
    pub async fn handle_rejection(
        &self,
        error: &AuthError,
        sent_token: Option<&str>,
    ) -> Option<Redirect> {
        match error {
            AuthError::Forbidden => Some(Redirect::Unauthorized),
            AuthError::NetworkFailure(_) => None,
            _ => {
                let _persist = self.persist.lock().await;
                let held = self.token();
                if held.is_some() && held.as_deref() != sent_token {
                    debug!("Ignoring rejection for a token no longer held");
                    return None;
                }
                if held.is_none()
                    && matches!(
                        self.state.borrow().status(),
                        SessionStatus::Hydrating | SessionStatus::Unavailable
                    )
                {
                    debug!("Ignoring rejection received before the session settled");
                    return None;
                }

                warn!(code = error.code(), "Server rejected session token");
                self.discard(Session::anonymous_with(error.clone()));
                if let Err(e) = self.clear_storage().await {
                    error!(error = %e, "Failed to purge rejected token");
                }
                Some(Redirect::Login)
            }
        }
    }

    /// 폐기 후 남아 있는 저장소 토큰을 삭제합니다.
    pub async fn flush_pending_purge(&self) {
        if !self.purge_pending() {
            return;
        }

        let _persist = self.persist.lock().await;
        if !self.purge_pending() {
            return;
        }
        if let Err(e) = self.clear_storage().await {
            error!(error = %e, "Failed to purge discarded token");
        }
    }

    async fn verify(&self, token: &str) -> Result<VerifiedSession, AuthError> {
        match tokio::time::timeout(self.verify_timeout, self.verifier.verify(token)).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::NetworkFailure(format!(
                "verification timed out after {}s",
                self.verify_timeout.as_secs_f64()
            ))),
        }
    }

    /// 저장소 삭제. 성공한 경우에만 `purge_pending`을 내립니다. 호출자는 `persist`
    /// 잠금을 보유해야 합니다.
    async fn clear_storage(&self) -> Result<(), StorageError> {
        self.storage.clear().await?;
        self.lock_inner().purge_pending = false;
        Ok(())
    }

    /// 관찰한 epoch가 여전히 최신이면 토큰을 폐기하고 저장소에서 삭제합니다.
    async fn purge_if_current(&self, epoch: u64, session: Session) -> Result<(), StorageError> {
        let _persist = self.persist.lock().await;
        {
            let mut inner = self.lock_inner();
            if inner.epoch != epoch {
                debug!(epoch, current = inner.epoch, "Discarding superseded session result");
                return Ok(());
            }
            inner.discard();
            self.state.send_replace(session);
        }
        self.clear_storage().await
    }

    fn discard(&self, session: Session) {
        let mut inner = self.lock_inner();
        inner.discard();
        self.state.send_replace(session);
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("SessionStore mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn current_epoch(&self) -> u64 {
        self.lock_inner().epoch
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.current_epoch() == epoch
    }

    /// epoch가 최신이면 토큰과 세션을 함께 반영합니다. 저장소는 건드리지 않습니다.
    fn commit(&self, epoch: u64, token: Option<String>, session: Session) -> bool {
        let mut inner = self.lock_inner();
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Discarding superseded session result");
            return false;
        }
        inner.token = token;
        self.state.send_replace(session);
        true
    }

    fn publish_if_current(&self, epoch: u64, session: Session) {
        let inner = self.lock_inner();
        if inner.epoch == epoch {
            self.state.send_replace(session);
        }
    }
}
