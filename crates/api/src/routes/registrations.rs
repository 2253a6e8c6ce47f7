//! Participant registration and ticket routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::registration::{
    CreateRegistrationRequest, CreateRegistrationResponse, TicketVerification,
};
use domain::models::{
    NewRegistration, Registration, RegistrationDecision, RegistrationWithEvent, TicketId,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_registration_admitted, record_registration_rejected};

/// Register a participant for an event.
///
/// POST /api/v1/registrations
///
/// Rejections map to 404 (unknown event), 409 (already registered) or 400.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<CreateRegistrationResponse>), ApiError> {
    request.validate()?;

    match state
        .registrations
        .register(NewRegistration::from(request))
        .await?
    {
        RegistrationDecision::Admitted(receipt) => {
            record_registration_admitted();
            Ok((StatusCode::CREATED, Json(receipt.into())))
        }
        RegistrationDecision::Rejected(rejection) => {
            record_registration_rejected(rejection);
            Err(rejection.into())
        }
    }
}

/// Registrations for an event, newest first.
///
/// GET /api/v1/registrations/event/:event_id
pub async fn list_by_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    state
        .registrations
        .list_for_event(event_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// Full registration behind a ticket.
///
/// GET /api/v1/registrations/ticket/:ticket_id
pub async fn get_by_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<RegistrationWithEvent>, ApiError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;

    state
        .registrations
        .get_by_ticket(ticket_id.as_str())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))
}

/// Quick validity check for a presented ticket.
///
/// GET /api/v1/registrations/verify/:ticket_id
pub async fn verify_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketVerification>, ApiError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;
    Ok(Json(
        state.registrations.verify_ticket(ticket_id.as_str()).await?,
    ))
}

fn parse_ticket_id(raw: &str) -> Result<TicketId, ApiError> {
    TicketId::parse(raw).map_err(|e| ApiError::Validation(e.to_string()))
}
