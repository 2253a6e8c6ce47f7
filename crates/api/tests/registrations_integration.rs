//! Integration tests for registration and ticket endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_event, get_request, get_request_with_api_key, register, register_ticket,
    request_with_api_key, send, test_config, TestApp, TestParticipant,
};
use domain::services::MockTicketNotifier;
use std::time::Duration;

#[tokio::test]
async fn test_register_success_issues_ticket() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Hack Day", 50).await;
    let participant = TestParticipant::new();

    let (status, body) = register(&app.router, event_id, &participant).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification_sent"], true);
    assert_eq!(body["event_name"], "Hack Day");
    let ticket_id = body["ticket_id"].as_str().unwrap();
    let registration_id = body["registration_id"].as_i64().unwrap();
    assert!(ticket_id.starts_with(&format!("EVT{:04}-REG{:06}-", event_id, registration_id)));
    assert!(body["qr_code"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ticket_id, ticket_id);
    assert_eq!(sent[0].recipient_email, participant.email);
    assert_eq!(sent[0].event_date_display, "March 05, 2026 at 09:30 AM");
}

#[tokio::test]
async fn test_register_notification_failure_keeps_registration() {
    let app = TestApp::with_notifier(MockTicketNotifier::failing());
    let event_id = create_test_event(&app.router, "Flaky Mail", 5).await;

    let (status, body) = register(&app.router, event_id, &TestParticipant::new()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification_sent"], false);

    let (_, event) = app
        .send(get_request(&format!("/api/v1/events/{}", event_id)))
        .await;
    assert_eq!(event["registered_count"], 1);
}

#[tokio::test]
async fn test_register_notification_timeout_reports_not_sent() {
    let mut config = test_config();
    config.ticketing.notification_timeout_secs = 1;
    let app = TestApp::build(config, MockTicketNotifier::slow(Duration::from_secs(5)));
    let event_id = create_test_event(&app.router, "Slow Mail", 5).await;

    let (status, body) = register(&app.router, event_id, &TestParticipant::new()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notification_sent"], false);
}

#[tokio::test]
async fn test_register_duplicate_is_conflict() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Once Only", 10).await;
    let first = TestParticipant::with_email("dup@example.com");
    let second = TestParticipant::with_email("  DUP@Example.com");

    let (status, _) = register(&app.router, event_id, &first).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app.router, event_id, &second).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_registration");
    assert_eq!(body["message"], "You have already registered for this event");
}

#[tokio::test]
async fn test_register_closed_event_is_rejected() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Closed", 10).await;
    let (status, _) = app
        .send(request_with_api_key(
            Method::PATCH,
            &format!("/api/v1/events/{}/toggle-registration", event_id),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app.router, event_id, &TestParticipant::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "registration_closed");
}

#[tokio::test]
async fn test_register_capacity_one() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Tiny Room", 1).await;

    let (status, _) = register(&app.router, event_id, &TestParticipant::new()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app.router, event_id, &TestParticipant::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "event_full");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_never_exceed_capacity() {
    let app = TestApp::new();
    let capacity = 5;
    let event_id = create_test_event(&app.router, "Rush", capacity).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let router = app.router.clone();
        handles.push(tokio::spawn(async move {
            register(&router, event_id, &TestParticipant::new()).await.0
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => admitted += 1,
            StatusCode::BAD_REQUEST => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(admitted, capacity);

    let (_, event) = app
        .send(get_request(&format!("/api/v1/events/{}", event_id)))
        .await;
    assert_eq!(event["registered_count"], capacity);
}

#[tokio::test]
async fn test_register_unknown_event_is_not_found() {
    let app = TestApp::new();
    let (status, body) = register(&app.router, 404, &TestParticipant::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "event_not_found");
}

#[tokio::test]
async fn test_register_rejects_invalid_phone() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Validation", 10).await;
    let participant = TestParticipant {
        phone: "12-34".to_string(),
        ..TestParticipant::new()
    };

    let (status, body) = register(&app.router, event_id, &participant).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_verify_ticket_states() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Verify", 10).await;
    let participant = TestParticipant::new();
    let ticket_id = register_ticket(&app.router, event_id, &participant).await;

    let (status, body) = app
        .send(get_request(&format!(
            "/api/v1/registrations/verify/{}",
            ticket_id
        )))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["already_checked_in"], false);
    assert_eq!(body["participant_name"], participant.name.as_str());
    assert_eq!(body["event_name"], "Verify");

    let (status, body) = app
        .send(get_request(
            "/api/v1/registrations/verify/EVT9999-REG999999-ZZZZZZ",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Invalid ticket");

    let (status, _) = app
        .send(get_request("/api/v1/registrations/verify/garbage"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_by_ticket_requires_admin() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Lookup", 10).await;
    let participant = TestParticipant::new();
    let ticket_id = register_ticket(&app.router, event_id, &participant).await;
    let uri = format!("/api/v1/registrations/ticket/{}", ticket_id);

    let (status, _) = app.send(get_request(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send(get_request_with_api_key(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket_id"], ticket_id.as_str());
    assert_eq!(body["email"], participant.email.as_str());
    assert_eq!(body["event_name"], "Lookup");
    assert_eq!(body["checked_in"], false);

    let (status, _) = app
        .send(get_request_with_api_key(
            "/api/v1/registrations/ticket/EVT0001-REG000999-AAAAAA",
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_registrations_newest_first() {
    let app = TestApp::new();
    let event_id = create_test_event(&app.router, "Listing", 10).await;
    let first = TestParticipant::new();
    let second = TestParticipant::new();
    register_ticket(&app.router, event_id, &first).await;
    register_ticket(&app.router, event_id, &second).await;

    let (status, body) = send(
        &app.router,
        get_request_with_api_key(&format!("/api/v1/registrations/event/{}", event_id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec![second.email.as_str(), first.email.as_str()]);

    let (status, _) = app
        .send(get_request_with_api_key("/api/v1/registrations/event/777"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
