//! CLI 명령어 구현 모듈.

pub mod output;
pub mod request;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use portal_client::{ApiClient, FileTokenStorage, RemoteVerifier, SessionStore};
use portal_core::ClientConfig;

/// 명령 실행에 필요한 클라이언트 구성 요소.
pub struct CliContext {
    pub config: ClientConfig,
    pub store: Arc<SessionStore>,
    pub client: ApiClient,
}

impl CliContext {
    /// 파일 저장소와 원격 검증기로 구성.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let verifier = RemoteVerifier::with_timeout(config.base_url.clone(), timeout)
            .context("Failed to build HTTP client")?;

        let store = Arc::new(
            SessionStore::new(
                Arc::new(FileTokenStorage::new(&config.token_path)),
                Arc::new(verifier),
            )
            .with_verify_timeout(Duration::from_secs(config.hydration_timeout_secs)),
        );

        Self::with_store(config, store)
    }

    /// 이미 구성된 세션 저장소 사용.
    pub fn with_store(config: ClientConfig, store: Arc<SessionStore>) -> Result<Self> {
        let client = ApiClient::from_config(&config, store.clone())
            .context("Failed to build API client")?;
        Ok(Self {
            config,
            store,
            client,
        })
    }
}
