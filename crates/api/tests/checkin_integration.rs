//! Integration tests for check-in endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_event, get_request, get_request_with_api_key, json_request,
    json_request_with_api_key, register_ticket, TestApp, TestParticipant,
};
use serde_json::{json, Value};

async fn check_in_code(app: &TestApp, ticket_id: &str, event_id: i64) -> (StatusCode, Value) {
    app.send(json_request_with_api_key(
        Method::POST,
        "/api/v1/checkin/code",
        json!({ "ticket_id": ticket_id, "event_id": event_id }),
    ))
    .await
}

async fn check_in_identity(app: &TestApp, email: &str, event_id: i64) -> (StatusCode, Value) {
    app.send(json_request_with_api_key(
        Method::POST,
        "/api/v1/checkin/identity",
        json!({ "email": email, "event_id": event_id }),
    ))
    .await
}

async fn import_roster(app: &TestApp, records: Value) {
    let (status, body) = app
        .send(json_request_with_api_key(
            Method::POST,
            "/api/v1/roster/import",
            json!({ "records": records }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "roster import failed: {body}");
}

#[tokio::test]
async fn test_code_check_in_then_repeat() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Main Stage", 10).await;
    let participant = TestParticipant::new();
    let ticket_id = register_ticket(&app.router, event_id, &participant).await;

    let (status, body) = check_in_code(&app, &ticket_id, event_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["reason"], "success");
    assert_eq!(body["source"], "code");
    assert_eq!(body["participant_name"], participant.name.as_str());
    assert_eq!(body["event_name"], "Main Stage");
    let first_at = body["checked_in_at"].clone();

    let (status, body) = check_in_code(&app, &ticket_id, event_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], "already_checked_in");
    assert_eq!(body["checked_in_at"], first_at);

    let (_, verify) = app
        .send(get_request(&format!(
            "/api/v1/registrations/verify/{}",
            ticket_id
        )))
        .await;
    assert_eq!(verify["already_checked_in"], true);
}

#[tokio::test]
async fn test_code_check_in_wrong_event_does_not_mutate() {
    let app = TestApp::new();
    let ticketed = create_test_event(&app.router, "Day One", 10).await;
    let other = create_test_event(&app.router, "Day Two", 10).await;
    let ticket_id = register_ticket(&app.router, ticketed, &TestParticipant::new()).await;

    let (status, body) = check_in_code(&app, &ticket_id, other).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "wrong_event");
    assert_eq!(body["event_name"], "Day One");

    let (status, body) = check_in_code(&app, &ticket_id, ticketed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_code_check_in_unknown_ticket() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Door", 10).await;

    let (status, body) = check_in_code(&app, "EVT0001-REG000001-XXXXXX", event_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "not_found");
    assert_eq!(body["message"], "Invalid ticket");
}

#[tokio::test]
async fn test_identity_check_in_roster_participant() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Expo", 10).await;
    import_roster(
        &app,
        json!([{ "email": "c@x.com", "name": "Casey", "college": "Tech U" }]),
    )
    .await;

    let (status, body) = check_in_identity(&app, "C@X.com ", event_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "roster");
    assert_eq!(body["participant_name"], "Casey");
    assert_eq!(body["affiliation"], "Tech U");

    let (status, body) = check_in_identity(&app, "c@x.com", event_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "already_checked_in");
}

#[tokio::test]
async fn test_identity_check_in_ticket_holder_and_unknown() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Gala", 10).await;
    let participant = TestParticipant::with_email("holder@example.com");
    register_ticket(&app.router, event_id, &participant).await;

    let (status, body) = check_in_identity(&app, "holder@example.com", event_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "has_ticket");

    let (status, body) = check_in_identity(&app, "stranger@example.com", event_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
async fn test_identity_check_in_unknown_event() {
    let app = TestApp::new();
    import_roster(&app, json!([{ "email": "c@x.com" }])).await;

    let (status, body) = check_in_identity(&app, "c@x.com", 9999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_stats_counts_both_sources() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Packed", 2).await;
    let ticket_id = register_ticket(&app.router, event_id, &TestParticipant::new()).await;
    register_ticket(&app.router, event_id, &TestParticipant::new()).await;
    import_roster(
        &app,
        json!([
            { "email": "r1@x.com" },
            { "email": "r2@x.com" }
        ]),
    )
    .await;

    check_in_code(&app, &ticket_id, event_id).await;
    check_in_identity(&app, "r1@x.com", event_id).await;
    check_in_identity(&app, "r2@x.com", event_id).await;

    let (status, body) = app
        .send(get_request_with_api_key(&format!(
            "/api/v1/checkin/stats/{}",
            event_id
        )))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event_name"], "Packed");
    assert_eq!(body["capacity"], 2);
    assert_eq!(body["total_registrations"], 2);
    assert_eq!(body["checked_in_registrations"], 1);
    assert_eq!(body["roster_checkins"], 2);
    assert_eq!(body["total_checkins"], 3);
    assert_eq!(body["remaining_capacity"], -1);

    let (status, _) = app
        .send(get_request_with_api_key("/api/v1/checkin/stats/31337"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recent_check_ins_newest_first_and_limited() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Recent", 10).await;
    let records: Vec<Value> = (0..3)
        .map(|i| json!({ "email": format!("walkin{}@x.com", i) }))
        .collect();
    import_roster(&app, Value::Array(records)).await;

    for i in 0..3 {
        let (status, _) = check_in_identity(&app, &format!("walkin{}@x.com", i), event_id).await;
        assert_eq!(status, StatusCode::OK);
    }

    let uri = format!("/api/v1/checkin/recent/{}?limit=2", event_id);
    let (status, body) = app.send(get_request_with_api_key(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["walkin2@x.com", "walkin1@x.com"]);

    let uri = format!("/api/v1/checkin/recent/{}?limit=0", event_id);
    let (_, body) = app.send(get_request_with_api_key(&uri)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(get_request_with_api_key("/api/v1/checkin/recent/4040"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_check_in_requires_admin() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Locked", 10).await;

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/v1/checkin/code",
            json!({ "ticket_id": "EVT0001-REG000001-AAAAAA", "event_id": event_id }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(get_request(&format!("/api/v1/checkin/stats/{}", event_id)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
