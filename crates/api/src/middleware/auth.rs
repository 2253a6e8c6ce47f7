//! Authentication middleware.
//!
//! Administrative routes require the shared admin key in the `X-API-Key` header.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::crypto::secrets_match;

use crate::app::AppState;

/// Header carrying the admin key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Middleware for admin-only routes.
///
/// Rejects the request with 401 unless `X-API-Key` matches the configured
/// admin key.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if is_admin_key(key, &state.config.security.admin_api_key) => {
            next.run(req).await
        }
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "Rejected admin request with invalid API key");
            unauthorized_response("Invalid or missing API key")
        }
        None => unauthorized_response("Invalid or missing API key"),
    }
}

/// An empty configured key never authorizes anything.
fn is_admin_key(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && secrets_match(presented, expected)
}

/// Helper to create unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
