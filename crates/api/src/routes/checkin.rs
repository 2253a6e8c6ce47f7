//! Event-entry check-in routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::checkin::{CodeCheckInRequest, IdentityCheckInRequest, RecentCheckInsQuery};
use domain::models::{CheckInOutcome, CheckInRecord, CheckInStats};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_check_in;

/// Check in a ticket holder.
///
/// POST /api/v1/checkin/code
pub async fn check_in_by_code(
    State(state): State<AppState>,
    Json(request): Json<CodeCheckInRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let outcome = state
        .check_ins
        .check_in_by_code(&request.ticket_id, request.event_id)
        .await?;
    Ok(outcome_response(outcome))
}

/// Check in a participant by email.
///
/// POST /api/v1/checkin/identity
pub async fn check_in_by_identity(
    State(state): State<AppState>,
    Json(request): Json<IdentityCheckInRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;

    // Roster check-ins reference the event row.
    if state.store.find_event(request.event_id).await?.is_none() {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    let outcome = state
        .check_ins
        .check_in_by_identity(&request.email, request.event_id)
        .await?;
    Ok(outcome_response(outcome))
}

/// Successful admissions are 200; every other outcome is 400 with the same body.
fn outcome_response(outcome: CheckInOutcome) -> Response {
    if outcome.success {
        if let Some(source) = outcome.source {
            record_check_in(source);
        }
        (StatusCode::OK, Json(outcome)).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(outcome)).into_response()
    }
}

/// GET /api/v1/checkin/stats/:event_id
pub async fn stats(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<CheckInStats>, ApiError> {
    state
        .check_ins
        .stats(event_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Latest check-ins for an event, newest first.
///
/// GET /api/v1/checkin/recent/:event_id?limit=
pub async fn recent(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
    Query(query): Query<RecentCheckInsQuery>,
) -> Result<Json<Vec<CheckInRecord>>, ApiError> {
    let limit = state.config.ticketing.recent_limit(query.limit);
    Ok(Json(state.check_ins.recent(event_id, Some(limit)).await?))
}
