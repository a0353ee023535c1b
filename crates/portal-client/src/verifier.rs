//! 토큰 검증기.
//!
//! 접근 결정에 사용되는 신원은 반드시 서명을 확인하는 경로에서 나와야 합니다.
//! [`LocalVerifier`]는 서버와 동일한 [`ClaimsCodec`]을, [`RemoteVerifier`]는 서버의
//! 세션 엔드포인트를 사용합니다. 서명 없는 디코딩은 [`ClaimsCodec::preview`]뿐이며
//! 이는 검증기가 아닙니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::{AuthError, ClaimsCodec, Principal};
use serde::Deserialize;
use tracing::debug;

use crate::client::{network_failure, rejection_from_response};

/// 세션 엔드포인트 경로.
pub const SESSION_PATH: &str = "/api/auth/session";

/// 검증을 통과한 신원.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifiedSession {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// 토큰 검증기 trait.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 토큰을 검증하고 신원을 도출합니다.
    ///
    /// 만료/위조/형식 오류는 `InvalidToken`, 전송 실패는 `NetworkFailure`.
    async fn verify(&self, token: &str) -> Result<VerifiedSession, AuthError>;
}

/// 공유 시크릿으로 로컬에서 서명까지 검증하는 검증기.
#[derive(Clone)]
pub struct LocalVerifier {
    codec: ClaimsCodec,
}

impl LocalVerifier {
    pub fn new(codec: ClaimsCodec) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl TokenVerifier for LocalVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedSession, AuthError> {
        let claims = self.codec.decode(token)?;
        Ok(VerifiedSession {
            principal: claims.principal(),
            expires_at: claims.expires_at(),
        })
    }
}

/// 서버의 `GET /api/auth/session`으로 검증하는 검증기.
#[derive(Debug, Clone)]
pub struct RemoteVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteVerifier {
    /// 기본 타임아웃(10초)으로 생성.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// 요청 타임아웃을 지정하여 생성.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// 기존 HTTP 클라이언트 재사용.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedSession, AuthError> {
        let url = format!("{}{}", self.base_url, SESSION_PATH);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<VerifiedSession>()
                .await
                .map_err(network_failure);
        }

        match rejection_from_response(response).await {
            Some(error) => {
                debug!(code = error.code(), "Session endpoint rejected token");
                Err(error)
            }
            None => Err(AuthError::NetworkFailure(format!(
                "session endpoint returned {}",
                status
            ))),
        }
    }
}
