//! Security headers middleware.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Adds `nosniff`, `DENY` framing and legacy XSS filtering headers to every
/// response. HSTS is added only when `TK__SECURITY__HSTS_ENABLED=true`, which
/// belongs behind a TLS-terminating proxy.
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::HeaderName::from_static(headers::X_CONTENT_TYPE_OPTIONS),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static(headers::X_FRAME_OPTIONS),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::HeaderName::from_static(headers::X_XSS_PROTECTION),
        HeaderValue::from_static("1; mode=block"),
    );

    if hsts_enabled(std::env::var("TK__SECURITY__HSTS_ENABLED").ok().as_deref()) {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

fn hsts_enabled(flag: Option<&str>) -> bool {
    flag.map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Security header names.
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const X_XSS_PROTECTION: &str = "x-xss-protection";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsts_flag_parsing() {
        assert!(hsts_enabled(Some("true")));
        assert!(hsts_enabled(Some("TRUE")));
        assert!(!hsts_enabled(Some("1")));
        assert!(!hsts_enabled(Some("")));
        assert!(!hsts_enabled(None));
    }
}
