//! Prometheus 메트릭.
//!
//! 요청은 접근 영역(`area`)과 게이트 판정(`outcome`)으로 라벨링됩니다. 영역은
//! 경로 앞부분에서 고정된 값 집합으로 도출되므로 라벨 카디널리티가 제한됩니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 `BuildError`를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        )?
        .install_recorder()
}

/// 역할 게이트의 판정.
///
/// 게이트가 응답 extensions에 남기고 메트릭 레이어가 읽습니다. 게이트를 거치지
/// 않은 응답(헬스 체크, 404 등)에는 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted,
    /// 거부 에러 코드 (`"MISSING_TOKEN"`, `"FORBIDDEN"` 등)
    Rejected(&'static str),
}

impl AccessOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            AccessOutcome::Granted => "granted",
            AccessOutcome::Rejected(code) => code,
        }
    }
}

/// 요청 경로의 접근 영역.
pub fn access_area(path: &str) -> &'static str {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("api"), Some("admin")) => "admin",
        (Some("api"), Some("instructor")) => "instructor",
        (Some("api"), Some("learner")) => "learner",
        (Some("api"), Some("auth")) => "session",
        (Some("health"), _) => "health",
        (Some("metrics"), _) => "metrics",
        _ => "other",
    }
}

/// 완료된 요청 하나를 기록합니다.
///
/// - `http_requests_total{area, outcome, status}`: 게이트가 없으면 outcome은 `"public"`
/// - `http_request_duration_seconds{area}`
/// - `auth_decisions_total{area, outcome}`: 게이트를 거친 요청만
pub fn record_request(
    area: &'static str,
    outcome: Option<AccessOutcome>,
    status: u16,
    duration_secs: f64,
) {
    let outcome_label = outcome.map_or("public", |o| o.as_label());

    counter!(
        "http_requests_total",
        "area" => area,
        "outcome" => outcome_label,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "area" => area).record(duration_secs);

    if let Some(outcome) = outcome {
        counter!("auth_decisions_total", "area" => area, "outcome" => outcome.as_label())
            .increment(1);
    }
}
