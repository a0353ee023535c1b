//! JWT 토큰 코덱.
//!
//! 서명 검증과 만료 검증을 하나의 원자적 단계로 수행합니다. 서명이 틀렸거나
//! 만료된 토큰은 "플래그가 붙은 Claims"가 아니라 디코딩 실패입니다.

use std::sync::Arc;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use crate::claims::PreviewPayload;
use crate::{AuthConfig, Claims, ClaimsPreview, DecodeError, Principal, Role};

/// 권장 최소 시크릿 길이 (바이트).
const MIN_SECRET_LEN: usize = 32;

/// 코덱 생성/인코딩 에러.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JWT 시크릿이 설정되지 않았습니다")]
    MissingSecret,
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("코덱 자체 검증 실패: {0}")]
    SelfCheck(DecodeError),
}

/// 서버와 클라이언트가 공유하는 Claims 코덱.
///
/// 내부 키는 `Arc`로 공유되므로 복제 비용이 작고, 상태가 없어 여러 요청에서
/// 동시에 사용해도 안전합니다.
#[derive(Clone)]
pub struct ClaimsCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    issuer: Option<String>,
    weak_secret: bool,
}

impl ClaimsCodec {
    /// 인증 설정으로 코덱 생성.
    ///
    /// # Errors
    /// 시크릿이 비어 있으면 `CodecError::MissingSecret`을 반환합니다.
    pub fn new(config: &AuthConfig) -> Result<Self, CodecError> {
        let secret = config.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(CodecError::MissingSecret);
        }
        let weak_secret = secret.len() < MIN_SECRET_LEN;
        if weak_secret {
            warn!("JWT secret is shorter than recommended ({} bytes)", MIN_SECRET_LEN);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;
        if let Some(ref issuer) = config.issuer {
            // set_issuer만으로는 iss가 없는 토큰이 통과함
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
            issuer: config.issuer.clone(),
            weak_secret,
        })
    }

    /// 설정된 발급자.
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// 시크릿이 권장 길이보다 짧은지 여부.
    pub fn has_weak_secret(&self) -> bool {
        self.weak_secret
    }

    /// 합성 Claims를 서명한 뒤 다시 검증하여 키와 검증 규칙이 맞물리는지 확인합니다.
    pub fn self_check(&self) -> Result<(), CodecError> {
        let sample = Principal {
            id: "readiness-check".to_string(),
            display_name: "readiness".to_string(),
            email: "readiness@localhost".to_string(),
            role: Role::Learner,
            profile_image: None,
            preferences: None,
        };
        let token = self.encode(&Claims::new(&sample, chrono::Duration::minutes(1)))?;
        let decoded = self.decode(&token).map_err(CodecError::SelfCheck)?;
        if decoded.principal() != sample {
            return Err(CodecError::SelfCheck(DecodeError::Malformed));
        }
        Ok(())
    }

    /// 토큰 디코딩 및 검증.
    ///
    /// 서명, 만료, 역할 값(닫힌 열거형), 설정된 경우 발급자를 모두 확인합니다.
    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => DecodeError::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        DecodeError::BadSignature
                    }
                    _ => DecodeError::Malformed,
                };
                debug!(error = %e, reason = ?reason, "Token rejected");
                reason
            })
    }

    /// Claims 서명.
    ///
    /// 코덱에 발급자가 설정되어 있고 Claims에 없으면 채워 넣습니다.
    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        let header = Header::new(Algorithm::HS256);
        match (&self.issuer, &claims.iss) {
            (Some(issuer), None) => {
                let stamped = claims.clone().with_issuer(issuer.clone());
                encode(&header, &stamped, &self.encoding_key).map_err(CodecError::from)
            }
            _ => encode(&header, claims, &self.encoding_key).map_err(CodecError::from),
        }
    }

    /// 서명 검증 없이 페이로드를 읽습니다.
    ///
    /// 결과는 표시용 미리보기일 뿐이며 접근 허용 판단에 사용할 수 없습니다.
    pub fn preview(token: &str) -> Result<ClaimsPreview, DecodeError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<PreviewPayload>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims.into())
            .map_err(|_| DecodeError::Malformed)
    }
}
