use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::services::{
    CheckInService, RegistrationService, RosterService, TicketNotifier, TicketingStore,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, security_headers_middleware, trace_id,
};
use crate::routes::{checkin, events, health, registrations, roster};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn TicketingStore>,
    pub registrations: RegistrationService,
    pub check_ins: CheckInService,
    pub roster: RosterService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn TicketingStore>,
        notifier: Arc<dyn TicketNotifier>,
    ) -> Self {
        let registrations = RegistrationService::new(
            store.clone(),
            notifier,
            config.ticketing.notification_timeout(),
        );
        let check_ins = CheckInService::new(store.clone());
        let roster = RosterService::new(store.clone())
            .with_max_error_details(config.ticketing.max_import_error_details);

        Self {
            config: Arc::new(config),
            store,
            registrations,
            check_ins,
            roster,
        }
    }
}

pub fn create_app(
    config: Config,
    store: Arc<dyn TicketingStore>,
    notifier: Arc<dyn TicketNotifier>,
) -> Router {
    let state = AppState::new(config, store, notifier);
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Participant-facing routes
    let public_routes = Router::new()
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route("/api/v1/registrations", post(registrations::register))
        .route(
            "/api/v1/registrations/verify/:ticket_id",
            get(registrations::verify_ticket),
        );

    // Organizer routes (require the admin key)
    let admin_routes = Router::new()
        .route("/api/v1/events", post(events::create_event))
        .route(
            "/api/v1/events/:event_id/toggle-registration",
            patch(events::toggle_registration),
        )
        .route(
            "/api/v1/registrations/event/:event_id",
            get(registrations::list_by_event),
        )
        .route(
            "/api/v1/registrations/ticket/:ticket_id",
            get(registrations::get_by_ticket),
        )
        .route("/api/v1/roster/upload", post(roster::upload_csv))
        .route("/api/v1/roster/import", post(roster::import_json))
        .route(
            "/api/v1/roster",
            get(roster::list_roster).delete(roster::clear_roster),
        )
        .route("/api/v1/roster/summary", get(roster::roster_summary))
        .route("/api/v1/roster/:email", get(roster::lookup))
        .route("/api/v1/checkin/code", post(checkin::check_in_by_code))
        .route(
            "/api/v1/checkin/identity",
            post(checkin::check_in_by_identity),
        )
        .route("/api/v1/checkin/stats/:event_id", get(checkin::stats))
        .route("/api/v1/checkin/recent/:event_id", get(checkin::recent))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let ops_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(ops_routes)
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
