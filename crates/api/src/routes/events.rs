//! Event management routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::event::{
    CreateEventRequest, CreateEventResponse, Event, EventResponse, ToggleRegistrationResponse,
};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Create an event.
///
/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), ApiError> {
    request.validate()?;

    let event = state.store.create_event(&request).await?;

    info!(
        event_id = event.id,
        event_name = %event.name,
        capacity = event.capacity,
        "Event created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            message: "Event created successfully".to_string(),
            event,
        }),
    ))
}

/// List all events, earliest first.
///
/// GET /api/v1/events
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.store.list_events().await?))
}

/// Get one event with its current registration count.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state
        .store
        .find_event(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    let registered_count = state.store.count_registrations(event_id).await?;

    Ok(Json(EventResponse {
        event,
        registered_count,
    }))
}

/// Flip the registration-open flag.
///
/// PATCH /api/v1/events/:event_id/toggle-registration
pub async fn toggle_registration(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<ToggleRegistrationResponse>, ApiError> {
    let registration_open = state
        .store
        .toggle_registration(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    info!(event_id, registration_open, "Event registration toggled");

    Ok(Json(ToggleRegistrationResponse::new(registration_open)))
}
