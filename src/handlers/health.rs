use axum::http::StatusCode;

/// Liveness probe. Always 200 with an empty body, whatever the collector is doing.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
