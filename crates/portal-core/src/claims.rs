//! JWT 페이로드.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Principal, Role};

/// 서명 검증을 통과한 토큰 페이로드.
///
/// [`ClaimsCodec::decode`](crate::ClaimsCodec::decode)만이 외부 토큰으로부터
/// 이 값을 만들어냅니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 표시 이름
    pub name: String,
    /// 이메일
    pub email: String,
    /// 사용자 역할
    pub role: Role,
    /// 프로필 이미지 참조
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// 사용자 환경설정
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// JWT ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// 주체와 유효 기간으로 Claims 생성.
    pub fn new(principal: &Principal, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: principal.id.clone(),
            name: principal.display_name.clone(),
            email: principal.email.clone(),
            role: principal.role,
            picture: principal.profile_image.clone(),
            preferences: principal.preferences.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: None,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// 발급자 설정.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// 페이로드가 나타내는 주체.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.sub.clone(),
            display_name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            profile_image: self.picture.clone(),
            preferences: self.preferences.clone(),
        }
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp_to_utc(self.exp)
    }
}

/// 서명 검증 없이 읽어낸 토큰 페이로드.
///
/// 왕복 요청 전에 이름을 미리 채우는 용도의 미리보기일 뿐이며,
/// [`Principal`]로 변환되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPreview {
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// 토큰에 적힌 역할 문자열 (검증되지 않음)
    pub role_hint: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// 미리보기용 느슨한 페이로드.
#[derive(Debug, Deserialize)]
pub(crate) struct PreviewPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl From<PreviewPayload> for ClaimsPreview {
    fn from(payload: PreviewPayload) -> Self {
        Self {
            display_name: payload.name,
            email: payload.email,
            role_hint: payload.role,
            expires_at: payload.exp.map(timestamp_to_utc),
        }
    }
}

fn timestamp_to_utc(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Principal {
        Principal {
            id: "a-1".to_string(),
            display_name: "Ada".to_string(),
            email: "ada@campus.test".to_string(),
            role: Role::Admin,
            profile_image: Some("avatars/a-1.png".to_string()),
            preferences: None,
        }
    }

    #[test]
    fn test_claims_round_trip_principal() {
        let claims = Claims::new(&admin(), Duration::minutes(30));
        assert_eq!(claims.principal(), admin());
        assert!(claims.jti.is_some());
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_expires_at_from_exp() {
        let claims = Claims::new(&admin(), Duration::minutes(-5));
        assert!(claims.expires_at() < Utc::now());
        assert_eq!(claims.expires_at().timestamp(), claims.exp);
    }
}
