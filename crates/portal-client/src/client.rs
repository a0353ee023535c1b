//! 인증 API 클라이언트.
//!
//! 세션 저장소가 보유한 토큰을 `Authorization: Bearer`로 첨부하고, 서버의 거부
//! 응답을 공유 에러 분류로 복원하여 세션 저장소에 반영합니다.
//!
//! 클라이언트는 요청 전에 토큰 만료를 직접 판단하지 않습니다. 만료된 토큰은 서버가
//! 401로 거부하고, 그 거부가 세션을 `Anonymous`로 전이시킵니다.

use std::sync::Arc;
use std::time::Duration;

use portal_core::{AuthError, ClientConfig};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::guard::Redirect;
use crate::session::SessionStore;

/// API 클라이언트 에러.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 서버가 401/403으로 거부
    #[error("요청이 거부되었습니다: {error}")]
    Rejected {
        error: AuthError,
        redirect: Option<Redirect>,
    },

    /// 전송 실패 또는 타임아웃
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 그 밖의 실패 응답
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("응답 파싱 실패: {0}")]
    Decode(String),
}

impl ClientError {
    /// 공유 에러 분류로의 매핑.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            ClientError::Rejected { error, .. } => Some(error.clone()),
            ClientError::Network(message) => Some(AuthError::NetworkFailure(message.clone())),
            _ => None,
        }
    }

    /// 거부에 따른 리다이렉트.
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            ClientError::Rejected { redirect, .. } => *redirect,
            _ => None,
        }
    }
}

/// 서버 에러 응답 본문. `ApiErrorResponse`와 같은 형태입니다.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    }
}

/// reqwest 에러를 네트워크 장애로 변환.
pub(crate) fn network_failure(error: reqwest::Error) -> AuthError {
    AuthError::NetworkFailure(transport_message(&error))
}

/// 401/403 응답에서 에러 복원. 그 밖의 상태는 `None`.
pub(crate) async fn rejection_from_response(response: reqwest::Response) -> Option<AuthError> {
    let status = response.status().as_u16();
    if status != 401 && status != 403 {
        return None;
    }
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    AuthError::from_rejection(status, body.code.as_deref())
}

/// 세션 저장소와 연결된 API 클라이언트.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        store: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    /// 클라이언트 설정으로 생성.
    pub fn from_config(config: &ClientConfig, store: Arc<SessionStore>) -> Result<Self, ClientError> {
        Self::new(
            config.base_url.clone(),
            store,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// GET 요청 후 JSON 역직렬화.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None).await
    }

    /// 임의 메서드 요청. 본문은 JSON으로 전송됩니다.
    ///
    /// 세션 하이드레이션이 끝난 뒤에 보내므로, 저장된 토큰이 검증되는 동안
    /// 토큰 없는 요청이 나가지 않습니다.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ClientError> {
        self.store.ensure_hydrated().await;
        self.store.flush_pending_purge().await;

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let token = self.store.token();

        let mut builder = self.http.request(method.clone(), &url);
        if let Some(ref token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = transport_message(&e);
                warn!(%method, %url, error = %message, "Request failed");
                return Err(ClientError::Network(message));
            }
        };

        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "Response received");

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error = rejection_from_response(response)
                .await
                .unwrap_or(AuthError::Forbidden);
            let redirect = self.store.handle_rejection(&error, token.as_deref()).await;
            return Err(ClientError::Rejected { error, redirect });
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            message: body
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
        })
    }
}
