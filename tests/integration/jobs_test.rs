//! Submission, status and statistics endpoints.

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::{Value, json};

use jobhub_core::traits::JobBroker;
use jobhub_core::types::JobHandle;

use crate::helpers::TestApp;

fn email_job() -> Value {
    json!({
        "jobClass": "EmailSend",
        "to": "a@b.com",
        "template": "welcome",
        "data": {}
    })
}

fn verification_job() -> Value {
    json!({
        "jobClass": "IdentityVerification",
        "userId": "0190f5c2-7a10-7000-8000-00000000a001",
        "documentType": "passport",
        "documentNumber": "X1234567",
        "imageUrls": ["https://img.example.com/front.jpg"]
    })
}

async fn total_jobs(app: &TestApp) -> u64 {
    let response = app.request("GET", "/stats", None).await;
    assert_eq!(response.status, StatusCode::OK);
    response.body["totals"]
        .as_object()
        .expect("totals")
        .values()
        .map(|v| v.as_u64().unwrap_or(0))
        .sum()
}

#[tokio::test]
async fn test_email_submission_is_accepted_and_waiting() {
    let app = TestApp::new();

    let response = app.request("POST", "/jobs", Some(email_job())).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let handle = response.body["handle"].as_str().expect("handle").to_string();
    let location = response.body["statusLocation"].as_str().expect("location");
    assert_eq!(location, format!("/jobs/{handle}"));
    assert_eq!(
        response.headers.get("location").and_then(|v| v.to_str().ok()),
        Some(location)
    );

    let status = app.request("GET", location, None).await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["state"], "waiting");
    assert_eq!(status.body["progress"], 0);
    assert_eq!(status.body["attemptsMade"], 0);
    assert_eq!(status.body["jobClass"], "EmailSend");
    assert!(status.body["timestamps"]["createdAt"].is_string());
    assert!(status.body.get("result").is_none());
}

#[tokio::test]
async fn test_submission_by_path_class() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/jobs/email-send",
            Some(json!({ "to": "a@b.com", "template": "welcome", "data": {} })),
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let mismatched = app.request("POST", "/jobs/PushNotify", Some(email_job())).await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatched.body["validationErrors"][0]["field"], "jobClass");
}

#[tokio::test]
async fn test_identical_submissions_get_distinct_handles() {
    let app = TestApp::new();
    let first = app.request("POST", "/jobs", Some(email_job())).await;
    let second = app.request("POST", "/jobs", Some(email_job())).await;
    assert_ne!(first.body["handle"], second.body["handle"]);
    assert_eq!(total_jobs(&app).await, 2);
}

#[tokio::test]
async fn test_short_document_number_lists_field_errors() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/jobs",
            Some(json!({ "jobClass": "IdentityVerification", "documentNumber": "ab" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let errors = response.body["validationErrors"].as_array().expect("errors");
    let code_of = |field: &str| {
        errors
            .iter()
            .find(|e| e["field"] == field)
            .map(|e| e["code"].clone())
    };
    assert_eq!(code_of("documentNumber"), Some(json!("out_of_range")));
    assert_eq!(code_of("imageUrls"), Some(json!("missing")));

    assert_eq!(total_jobs(&app).await, 0);
}

#[tokio::test]
async fn test_missing_required_field_enqueues_nothing() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/jobs",
            Some(json!({ "jobClass": "EmailSend", "template": "welcome", "data": {} })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["validationErrors"][0]["field"], "to");
    assert_eq!(total_jobs(&app).await, 0);
}

#[tokio::test]
async fn test_unknown_class_and_bad_json_are_rejected() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/jobs", Some(json!({ "jobClass": "FaxSend" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["validationErrors"][0]["code"], "unknown_value");

    let response = app.request("POST", "/jobs/fax-send", Some(json!({}))).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/jobs")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_and_malformed_handles_are_not_found() {
    let app = TestApp::new();

    let response = app
        .request("GET", &format!("/jobs/{}", JobHandle::new()), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("GET", "/jobs/not-a-handle", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failing_job_exhausts_attempts_with_backoff() {
    let app = TestApp::new();

    let response = app.request("POST", "/jobs", Some(verification_job())).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    let handle: JobHandle = response.body["handle"].as_str().unwrap().parse().unwrap();
    let queue = "identity-verification";

    // 60s base exponential backoff, three attempts.
    let delays = [60, 120];
    for (attempt, delay) in delays.iter().enumerate() {
        let job = app.broker.claim_next(queue, "w").await.unwrap().unwrap();
        assert_eq!(job.attempt as usize, attempt + 1);
        app.broker
            .fail(&handle, job.lock_token, "provider 503", true)
            .await
            .unwrap();

        let status = app.request("GET", &format!("/jobs/{handle}"), None).await;
        assert_eq!(status.body["state"], "delayed");

        app.clock.advance(Duration::seconds(delay - 1));
        assert!(app.broker.claim_next(queue, "w").await.unwrap().is_none());
        app.clock.advance(Duration::seconds(1));
    }

    let job = app.broker.claim_next(queue, "w").await.unwrap().unwrap();
    assert_eq!(job.attempt, 3);
    app.broker
        .fail(&handle, job.lock_token, "provider 503", true)
        .await
        .unwrap();

    let status = app.request("GET", &format!("/jobs/{handle}"), None).await;
    assert_eq!(status.body["state"], "failed");
    assert_eq!(status.body["attemptsMade"], 3);
    assert_eq!(status.body["failureReason"], "provider 503");
    assert!(app.broker.claim_next(queue, "w").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stats_count_by_class() {
    let app = TestApp::new();
    app.request("POST", "/jobs", Some(email_job())).await;
    app.request("POST", "/jobs", Some(verification_job())).await;
    app.request("POST", "/jobs", Some(verification_job())).await;

    let response = app.request("GET", "/stats", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let classes = response.body["classes"].as_array().expect("classes");
    assert_eq!(classes.len(), 5);
    assert_eq!(classes[0]["jobClass"], "PushNotify");
    let verification = classes
        .iter()
        .find(|c| c["jobClass"] == "IdentityVerification")
        .unwrap();
    assert_eq!(verification["counts"]["waiting"], 2);
    assert_eq!(verification["tier"], "high");
    assert_eq!(response.body["totals"]["waiting"], 3);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request("GET", "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["broker"], "connected");
}
