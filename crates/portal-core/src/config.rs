//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 클라이언트 설정
    pub client: ClientConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록 (비어 있으면 모두 허용)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 바인딩 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 서명 시크릿
    #[serde(deserialize_with = "deserialize_secret")]
    pub jwt_secret: SecretString,
    /// 시계 오차 허용 (초)
    pub leeway_secs: u64,
    /// 기대 발급자 (설정 시 검증)
    pub issuer: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::from(String::new()),
            leeway_secs: 0,
            issuer: None,
        }
    }
}

impl AuthConfig {
    /// 주어진 시크릿으로 설정 생성.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: SecretString::from(secret.into()),
            ..Default::default()
        }
    }

    /// 시계 오차 허용치 설정.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// 발급자 설정.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// 클라이언트(세션 저장소 / API 클라이언트) 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API 서버 기본 URL
    pub base_url: String,
    /// 토큰 저장 파일 경로
    pub token_path: String,
    /// API 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 세션 하이드레이션/프로필 갱신 타임아웃 (초)
    pub hydration_timeout_secs: u64,
    /// 로그인 진입 경로
    pub login_path: String,
    /// 권한 없음 페이지 경로
    pub unauthorized_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            token_path: ".portal/session.json".to_string(),
            request_timeout_secs: 10,
            hydration_timeout_secs: 5,
            login_path: "/login".to_string(),
            unauthorized_path: "/unauthorized".to_string(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 `PORTAL__*` 환경 변수만 사용합니다.
    /// 예: `PORTAL__AUTH__JWT_SECRET`, `PORTAL__SERVER__PORT`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("PORTAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/portal.toml")
    }
}
