//! Axum용 토큰 검증 미들웨어.
//!
//! 미들웨어는 요청 간 상태를 갖지 않습니다. 결과는 토큰과 설정된 허용 역할
//! 집합에만 의존하므로 동시 요청에서 잠금 없이 실행됩니다. 실패는 핸들러
//! 실행 전에 단락(short-circuit)됩니다.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use portal_core::{AuthError, ClaimsCodec, Principal, RoleSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiErrorResponse;
use crate::metrics::AccessOutcome;

/// 검증을 통과한 요청의 주체.
///
/// 미들웨어가 요청 extensions에 첨부하며, 핸들러에서 추출기로 사용합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authenticated {
    /// 디코딩된 주체
    pub principal: Principal,
    /// 토큰 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 미들웨어 설정.
#[derive(Clone)]
pub struct AuthGate {
    codec: ClaimsCodec,
    allowed: RoleSet,
}

impl AuthGate {
    /// 허용 역할 집합으로 게이트 생성. 빈 집합은 인증만 요구합니다.
    pub fn new(codec: ClaimsCodec, allowed: RoleSet) -> Self {
        Self { codec, allowed }
    }
}

/// 인증 거부 응답.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRejection(pub AuthError);

impl From<AuthError> for AuthRejection {
    fn from(error: AuthError) -> Self {
        Self(error)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self
            .0
            .http_status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::SERVICE_UNAVAILABLE);

        let mut response =
            ApiErrorResponse::new(self.0.code(), self.0.to_string()).into_response_with(status);

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Authorization 헤더에서 Bearer 토큰 추출.
///
/// 스킴은 대소문자를 구분하지 않으며, 빈 토큰은 없는 것으로 취급합니다.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// 요청 헤더를 검증하고 주체를 도출합니다.
///
/// - 헤더 없음 / Bearer 아님 → `MissingToken`
/// - 디코딩 실패 (서명, 형식, 만료) → `InvalidToken`
/// - 비어 있지 않은 허용 집합에 역할이 없음 → `Forbidden`
pub fn authorize(
    headers: &HeaderMap,
    codec: &ClaimsCodec,
    allowed: RoleSet,
) -> Result<Authenticated, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
    let claims = codec.decode(token)?;

    if !allowed.permits(claims.role) {
        debug!(
            principal = %claims.sub,
            role = %claims.role,
            allowed = %allowed,
            "Role not permitted"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(Authenticated {
        principal: claims.principal(),
        expires_at: claims.expires_at(),
    })
}

/// 허용 역할을 강제하는 미들웨어 함수.
///
/// `axum::middleware::from_fn_with_state(gate, require_roles)`로 사용합니다.
/// 판정은 응답 extensions에 [`AccessOutcome`]으로 남습니다.
pub async fn require_roles(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(request.headers(), &gate.codec, gate.allowed) {
        Ok(authenticated) => {
            debug!(
                principal = %authenticated.principal.id,
                role = %authenticated.principal.role,
                path = %request.uri().path(),
                "Request authorized"
            );
            request.extensions_mut().insert(authenticated);
            let mut response = next.run(request).await;
            response.extensions_mut().insert(AccessOutcome::Granted);
            response
        }
        Err(error) => {
            let code = error.code();
            warn!(code, path = %request.uri().path(), "Request rejected");
            let mut response = AuthRejection(error).into_response();
            response
                .extensions_mut()
                .insert(AccessOutcome::Rejected(code));
            response
        }
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 미들웨어 없이 마운트된 핸들러는 거부
        parts
            .extensions
            .get::<Authenticated>()
            .cloned()
            .ok_or(AuthRejection(AuthError::MissingToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use portal_core::{AuthConfig, Claims, DecodeError, Role};

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec() -> ClaimsCodec {
        ClaimsCodec::new(&AuthConfig::new(TEST_SECRET)).unwrap()
    }

    fn token_for(role: Role, ttl: Duration) -> String {
        let principal = Principal {
            id: format!("{}-7", role),
            display_name: "Sam".to_string(),
            email: "sam@campus.test".to_string(),
            role,
            profile_image: None,
            preferences: None,
        };
        codec().encode(&Claims::new(&principal, ttl)).unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
        assert!(bearer_token(&headers_with("Basic abc")).is_none());
        assert!(bearer_token(&headers_with("Bearer")).is_none());
        assert!(bearer_token(&headers_with("Bearer   ")).is_none());
        assert_eq!(bearer_token(&headers_with("Bearer mytoken123")), Some("mytoken123"));
        assert_eq!(bearer_token(&headers_with("bearer mytoken123")), Some("mytoken123"));
    }

    #[test]
    fn test_authorize_missing_token() {
        let result = authorize(&HeaderMap::new(), &codec(), RoleSet::any());
        assert_eq!(result, Err(AuthError::MissingToken));

        let result = authorize(&headers_with("Basic dXNlcjpwYXNz"), &codec(), RoleSet::any());
        assert_eq!(result, Err(AuthError::MissingToken));
    }

    #[test]
    fn test_authorize_invalid_token() {
        let result = authorize(&headers_with("Bearer garbage"), &codec(), RoleSet::any());
        assert_eq!(result, Err(AuthError::InvalidToken(DecodeError::Malformed)));
    }

    #[test]
    fn test_authorize_expired_token_any_role() {
        for role in Role::ALL {
            let header = format!("Bearer {}", token_for(role, Duration::minutes(-2)));
            let result = authorize(&headers_with(&header), &codec(), RoleSet::of(&[role]));
            assert_eq!(result, Err(AuthError::InvalidToken(DecodeError::Expired)));
        }
    }

    #[test]
    fn test_authorize_role_matrix() {
        let staff = RoleSet::of(&[Role::Admin, Role::Instructor]);

        for role in Role::ALL {
            let header = format!("Bearer {}", token_for(role, Duration::minutes(10)));
            let result = authorize(&headers_with(&header), &codec(), staff);

            if staff.contains(role) {
                let authenticated = result.unwrap();
                assert_eq!(authenticated.principal.role, role);
                assert_eq!(authenticated.principal.id, format!("{}-7", role));
            } else {
                assert_eq!(result, Err(AuthError::Forbidden));
            }
        }
    }

    #[test]
    fn test_authorize_empty_set_accepts_any_role() {
        for role in Role::ALL {
            let header = format!("Bearer {}", token_for(role, Duration::minutes(10)));
            assert!(authorize(&headers_with(&header), &codec(), RoleSet::any()).is_ok());
        }
    }

    #[test]
    fn test_rejection_responses() {
        let cases = [
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken(DecodeError::Expired), StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken(DecodeError::BadSignature), StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
        ];

        for (error, expected) in cases {
            let response = AuthRejection(error).into_response();
            assert_eq!(response.status(), expected);
            assert_eq!(
                response.headers().contains_key(header::WWW_AUTHENTICATE),
                expected == StatusCode::UNAUTHORIZED
            );
        }
    }
}
