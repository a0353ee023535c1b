//! 포털 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 저장된 세션 상태 확인 및 로그인/로그아웃
//! - 인증된 API 요청
//! - 라우트 가드 결정 확인
//! - 토큰 미리보기 (검증 없음)

pub mod commands;
