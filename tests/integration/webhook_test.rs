//! Completion webhook authentication and dispatch.

use axum::http::StatusCode;
use serde_json::{Value, json};

use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_entity::subject::VerificationStatus;

use crate::helpers::{SECRET, TestApp};

fn event(subject: SubjectId, job_class: &str, status: &str, error: Option<Value>) -> Vec<u8> {
    let mut body = json!({
        "jobHandle": JobHandle::new(),
        "subjectId": subject,
        "jobClass": job_class,
        "status": status,
    });
    if let Some(error) = error {
        body["error"] = error;
    }
    serde_json::to_vec(&body).unwrap()
}

async fn notification_count(app: &TestApp, subject: SubjectId) -> u64 {
    app.stores
        .notifications
        .count_for_subject(subject)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unsigned_webhook_is_rejected() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "IdentityVerification", "completed", None);

    let response = app.post_webhook(&body, None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(notification_count(&app, subject).await, 0);
    assert!(app.stores.subjects.get(subject).await.unwrap().is_none());
}

#[tokio::test]
async fn test_signed_failed_verification_is_dispatched() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(
        subject,
        "IdentityVerification",
        "failed",
        Some(json!({
            "message": "OCR provider returned 422: MRZ checksum mismatch",
            "stack": "at mrz::parse (mrz.rs:88)"
        })),
    );

    let response = app.post_signed_webhook(&body, 0).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({}));

    assert_eq!(
        app.stores
            .subjects
            .verification_status(subject)
            .await
            .unwrap(),
        VerificationStatus::Failed
    );

    let notifications = app
        .stores
        .notifications
        .list_for_subject(subject)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(!notifications[0].message.contains("422"));
    assert!(!notifications[0].message.contains("MRZ"));
    assert!(!notifications[0].message.contains("mrz.rs"));
}

#[tokio::test]
async fn test_signed_completed_verification_marks_verified() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "IdentityVerification", "completed", None);

    let response = app.post_signed_webhook(&body, 0).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        app.stores
            .subjects
            .verification_status(subject)
            .await
            .unwrap(),
        VerificationStatus::Verified
    );
    assert_eq!(notification_count(&app, subject).await, 1);
}

#[tokio::test]
async fn test_timestamp_window() {
    let app = TestApp::new();
    let subject = SubjectId::new();

    let fresh = event(subject, "EmailSend", "completed", None);
    let response = app.post_signed_webhook(&fresh, 4 * 60).await;
    assert_eq!(response.status, StatusCode::OK);

    let stale = event(subject, "EmailSend", "completed", None);
    let response = app.post_signed_webhook(&stale, 6 * 60).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    assert_eq!(notification_count(&app, subject).await, 1);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "IdentityVerification", "failed", None);
    let timestamp = app.timestamp(0);
    let signature = app.sign(&body, Some(&timestamp));

    let mut tampered = body.clone();
    let at = tampered
        .windows(6)
        .position(|w| w == b"failed")
        .expect("status in body");
    tampered[at] = b'F';

    let response = app
        .post_webhook(&tampered, Some(&signature), Some(&timestamp))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.stores.subjects.get(subject).await.unwrap().is_none());
}

#[tokio::test]
async fn test_signature_survives_reserialization() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "EmailSend", "completed", None);
    let timestamp = app.timestamp(0);
    let signature = format!("sha256={}", app.sign(&body, Some(&timestamp)).to_uppercase());

    let value: Value = serde_json::from_slice(&body).unwrap();
    let pretty = serde_json::to_vec_pretty(&value).unwrap();

    let response = app
        .post_webhook(&pretty, Some(&signature), Some(&timestamp))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_secret_fails_closed() {
    let app = TestApp::with_secret(None);
    let subject = SubjectId::new();
    let body = event(subject, "IdentityVerification", "completed", None);

    let response = app.post_signed_webhook(&body, 0).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(notification_count(&app, subject).await, 0);
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "IdentityVerification", "completed", None);
    let timestamp = app.timestamp(0);

    let other = jobhub_auth::WebhookSigner::new(format!("{SECRET}-rotated").as_bytes()).unwrap();
    let signature = other.sign(&body, Some(&timestamp));

    let response = app
        .post_webhook(&body, Some(&signature), Some(&timestamp))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_but_malformed_event_is_bad_request() {
    let app = TestApp::new();
    let body = serde_json::to_vec(&json!({ "jobHandle": "nope", "status": "done" })).unwrap();

    let response = app.post_signed_webhook(&body, 0).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_class_is_acknowledged_and_dropped() {
    let app = TestApp::new();
    let subject = SubjectId::new();

    for class in ["FaxSend", "AnalyticsEvent"] {
        let body = event(subject, class, "completed", None);
        let response = app.post_signed_webhook(&body, 0).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    assert_eq!(notification_count(&app, subject).await, 0);
}

#[tokio::test]
async fn test_redelivered_webhook_records_once() {
    let app = TestApp::new();
    let subject = SubjectId::new();
    let body = event(subject, "EmailSend", "completed", None);

    for _ in 0..2 {
        let response = app.post_signed_webhook(&body, 0).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let record = app.stores.subjects.get(subject).await.unwrap().unwrap();
    assert_eq!(record.email_deliveries.len(), 1);
    assert_eq!(notification_count(&app, subject).await, 1);
}
