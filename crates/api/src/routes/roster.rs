//! Roster (imported allow-list) routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use domain::models::roster::{
    ClearRosterResponse, RosterImportRequest, RosterLookupResponse, RosterSummary,
};
use domain::models::{RosterEntry, RosterImportSummary};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_roster_rows_imported;
use crate::services::roster_csv::{parse_roster_csv, FIRST_DATA_ROW};

/// Import a roster from CSV text.
///
/// POST /api/v1/roster/upload
pub async fn upload_csv(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RosterImportSummary>, ApiError> {
    let rows = parse_roster_csv(&body).map_err(|e| ApiError::Validation(e.to_string()))?;
    let summary = state.roster.import_rows(rows, FIRST_DATA_ROW).await?;
    log_import("csv", &summary);
    Ok(Json(summary))
}

/// Import a roster from JSON records.
///
/// POST /api/v1/roster/import
pub async fn import_json(
    State(state): State<AppState>,
    Json(request): Json<RosterImportRequest>,
) -> Result<Json<RosterImportSummary>, ApiError> {
    request.validate()?;
    let summary = state.roster.import_batch(request.records).await?;
    log_import("json", &summary);
    Ok(Json(summary))
}

fn log_import(format: &'static str, summary: &RosterImportSummary) {
    record_roster_rows_imported(summary.imported);
    info!(
        format,
        total = summary.total,
        imported = summary.imported,
        duplicate = summary.duplicate,
        errors = summary.errors,
        "Roster imported"
    );
}

/// GET /api/v1/roster
pub async fn list_roster(State(state): State<AppState>) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    Ok(Json(state.roster.list().await?))
}

/// GET /api/v1/roster/summary
pub async fn roster_summary(State(state): State<AppState>) -> Result<Json<RosterSummary>, ApiError> {
    Ok(Json(state.roster.summary().await?))
}

/// Look up one participant; a miss is reported in the body, not as 404.
///
/// GET /api/v1/roster/:email
pub async fn lookup(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RosterLookupResponse>, ApiError> {
    Ok(Json(state.roster.get(&email).await?.into()))
}

/// Delete every roster entry.
///
/// DELETE /api/v1/roster
pub async fn clear_roster(
    State(state): State<AppState>,
) -> Result<Json<ClearRosterResponse>, ApiError> {
    let deleted = state.roster.clear().await?;
    info!(deleted, "Roster cleared");
    Ok(Json(ClearRosterResponse::new(deleted)))
}
