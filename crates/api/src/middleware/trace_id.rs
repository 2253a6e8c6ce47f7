//! Request tracing middleware.
//!
//! Every request carries an `X-Request-ID`, taken from the client when present
//! and generated otherwise, and runs inside a `request` span.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Request ID stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

pub async fn trace_id(mut req: Request<Body>, next: Next) -> Response {
    let request_id = resolve_request_id(
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let start = std::time::Instant::now();
    let mut response = next.run(req).instrument(span).await;

    tracing::info!(
        request_id = %request_id,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), header_value);
    }

    response
}

/// Keeps a client-supplied ID unless it is blank.
fn resolve_request_id(presented: Option<&str>) -> String {
    presented
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_client_id() {
        assert_eq!(resolve_request_id(Some("req-123_abc")), "req-123_abc");
    }

    #[test]
    fn test_resolve_generates_uuid_when_missing() {
        let generated = resolve_request_id(None);
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn test_resolve_generates_uuid_when_blank() {
        let generated = resolve_request_id(Some("   "));
        assert!(Uuid::parse_str(&generated).is_ok());
    }
}
