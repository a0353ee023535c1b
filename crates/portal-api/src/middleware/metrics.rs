//! 접근 메트릭 미들웨어.
//!
//! 가장 바깥쪽에 두어 게이트가 단락시킨 401/403 응답도 함께 집계합니다.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{access_area, record_request, AccessOutcome};

/// 요청 영역과 게이트 판정을 기록하는 미들웨어.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let area = access_area(request.uri().path());

    let response = next.run(request).await;

    let outcome = response.extensions().get::<AccessOutcome>().copied();
    record_request(
        area,
        outcome,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
