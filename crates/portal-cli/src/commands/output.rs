//! 출력 형식.

use anyhow::Result;
use portal_client::{GuardDecision, Redirect, Session};
use portal_core::ClientConfig;
use serde::Serialize;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: table, json", s)),
        }
    }
}

/// 세션 출력용 뷰.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            status: session.status().to_string(),
            principal_id: session.principal().map(|p| p.id.clone()),
            display_name: session.principal().map(|p| p.display_name.clone()),
            role: session.role().map(|r| r.to_string()),
            expires_at: session.expires_at().map(|t| t.to_rfc3339()),
            error: session.error().map(|e| e.code().to_string()),
        }
    }
}

/// 세션 렌더링.
pub fn render_session(session: &Session, format: OutputFormat) -> Result<String> {
    let view = SessionView::from(session);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&view)?),
        OutputFormat::Table => {
            let mut lines = vec![format!("{:<12} {}", "상태", view.status)];
            let fields = [
                ("주체", &view.principal_id),
                ("이름", &view.display_name),
                ("역할", &view.role),
                ("만료", &view.expires_at),
                ("사유", &view.error),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    lines.push(format!("{:<12} {}", label, value));
                }
            }
            Ok(lines.join("\n"))
        }
    }
}

/// 가드 결정 렌더링.
pub fn render_decision(path: &str, decision: GuardDecision, config: &ClientConfig) -> String {
    match decision {
        GuardDecision::Render => format!("{} → 렌더링", path),
        GuardDecision::Wait => format!("{} → 대기 (세션 미결정)", path),
        GuardDecision::Retry => format!("{} → 재시도 필요 (네트워크 장애)", path),
        GuardDecision::Redirect(redirect @ Redirect::Login) => {
            format!("{} → 로그인으로 이동 ({})", path, redirect.path(config))
        }
        GuardDecision::Redirect(redirect @ Redirect::Unauthorized) => {
            format!("{} → 권한 없음 ({})", path, redirect.path(config))
        }
    }
}
