//! # Portal Core
//!
//! 캠퍼스 포털의 인증 계약(claims/role)과 공통 인프라를 제공합니다.
//!
//! 서버(`portal-api`)와 클라이언트(`portal-client`)는 이 크레이트의 타입을
//! 공유하여 "유효한 신원"의 정의와 실패 분류를 일치시킵니다:
//! - 역할 및 역할 집합 ([`Role`], [`RoleSet`])
//! - 인증된 주체 ([`Principal`])
//! - 토큰 페이로드 ([`Claims`], [`ClaimsPreview`])
//! - 서명 검증 코덱 ([`ClaimsCodec`])
//! - 인증 실패 분류 ([`AuthError`], [`DecodeError`])
//! - 설정 관리
//! - 로깅 인프라

pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod principal;
pub mod role;

pub use claims::{Claims, ClaimsPreview};
pub use codec::{ClaimsCodec, CodecError};
pub use config::*;
pub use error::{AuthError, DecodeError};
pub use logging::*;
pub use principal::{Principal, ProfileUpdate};
pub use role::{Role, RoleSet, UnknownRole};
