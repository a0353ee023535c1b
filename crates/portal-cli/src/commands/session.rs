//! 세션 명령 (status, login, logout, preview).

use anyhow::{Context, Result};
use portal_client::SessionStatus;
use portal_core::{ClaimsCodec, ClaimsPreview};
use tracing::info;

use super::output::{render_session, OutputFormat};
use super::CliContext;

/// 저장된 세션을 하이드레이션하고 결과를 출력합니다.
pub async fn status(ctx: &CliContext, format: OutputFormat) -> Result<String> {
    let session = ctx.store.hydrate().await;
    ctx.store.flush_pending_purge().await;
    render_session(&session, format)
}

/// 외부에서 발급된 토큰으로 로그인합니다.
pub async fn login(ctx: &CliContext, token: &str, format: OutputFormat) -> Result<String> {
    ctx.store.hydrate().await;
    let session = ctx
        .store
        .login(token.trim())
        .await
        .context("Login rejected")?;

    info!(role = ?session.role(), "Session stored");
    render_session(&session, format)
}

/// 로그아웃하고 저장된 토큰을 삭제합니다.
pub async fn logout(ctx: &CliContext) -> Result<String> {
    let before = ctx.store.hydrate().await;
    ctx.store.logout().await.context("Failed to purge stored token")?;

    Ok(match before.status() {
        SessionStatus::Authenticated => "로그아웃되었습니다".to_string(),
        _ => "저장된 세션이 없었습니다".to_string(),
    })
}

/// 토큰 페이로드를 검증 없이 표시합니다.
///
/// 토큰 인자가 없으면 저장된 토큰을 사용합니다. 결과는 신원 증명이 아닙니다.
pub async fn preview(ctx: &CliContext, token: Option<&str>) -> Result<String> {
    let token = match token {
        Some(token) => token.trim().to_string(),
        None => {
            ctx.store.hydrate().await;
            ctx.store
                .token()
                .context("No stored session token; pass one with --token")?
        }
    };

    let preview = ClaimsCodec::preview(&token).context("Token payload is unreadable")?;
    Ok(render_preview(&preview))
}

fn render_preview(preview: &ClaimsPreview) -> String {
    let field = |v: Option<&str>| v.unwrap_or("-").to_string();
    [
        "미리보기 (서명 미검증)".to_string(),
        format!("{:<12} {}", "이름", field(preview.display_name.as_deref())),
        format!("{:<12} {}", "이메일", field(preview.email.as_deref())),
        format!("{:<12} {}", "역할 힌트", field(preview.role_hint.as_deref())),
        format!(
            "{:<12} {}",
            "만료",
            preview
                .expires_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string())
        ),
    ]
    .join("\n")
}
