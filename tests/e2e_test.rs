//! End-to-end tests against a running deployment
//!
//! These tests require:
//! 1. PostgreSQL database running (with migrations applied)
//! 2. Redis running
//! 3. API server running on configured port
//! 4. Worker process running
//! 5. Workers AI and R2 credentials configured
//!
//! Run with: cargo test --test e2e_test -- --ignored --nocapture
//!
//! Set API_BASE_URL to override default (http://localhost:3000)

mod fixtures;
mod helpers;

use fixtures::*;
use helpers::*;
use serde_json::{json, Value};

/// Get base URL from env or default to localhost
fn get_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn unique_email() -> String {
    format!("e2e-{}@example.com", uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore] // Requires running API server, worker, and all infrastructure
async fn test_e2e_health_check() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("Health check failed");

    assert!(
        response.status().is_success(),
        "Health check returned non-success status: {}",
        response.status()
    );

    let body: Value = response.json().await.expect("Invalid health body");
    assert_eq!(body["status"], "ok");
    println!("✓ Health check passed");
}

#[tokio::test]
#[ignore]
async fn test_e2e_report_is_orchestrated() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let fixture = &TEST_REPORTS[0];

    let created = submit_report(&client, &base_url, fixture, Some(TINY_PNG_BASE64))
        .await
        .expect("Failed to submit report");
    assert_eq!(created.status, "pending");
    println!("  ✓ Report created: {}", created.report_id);

    let processing = wait_for_orchestration(&client, &base_url, &created.report_id, 120)
        .await
        .expect("Report was not orchestrated");

    let elevated = matches!(fixture.severity, "high" | "critical");
    assert_run_consistent(&processing, created.image_url.is_some(), elevated);
}

#[tokio::test]
#[ignore]
async fn test_e2e_low_severity_skips_advisory() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let fixture = &TEST_REPORTS[2];

    let created = submit_report(&client, &base_url, fixture, None)
        .await
        .expect("Failed to submit report");
    assert!(created.image_url.is_none());

    let processing = wait_for_orchestration(&client, &base_url, &created.report_id, 120)
        .await
        .expect("Report was not orchestrated");
    assert_run_consistent(&processing, false, false);
}

#[tokio::test]
#[ignore]
async fn test_e2e_unsupported_image_rejected() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let body = json!({
        "user_id": "e2e-user",
        "location": { "latitude": 14.6, "longitude": 121.0 },
        "pollution_type": "waste",
        "severity": "low",
        "image_base64": "aGVsbG8gd29ybGQ="
    });
    let (status, envelope) = post_json::<Value>(&client, &format!("{}/api/v1/reports", base_url), &body)
        .await
        .expect("Request failed");

    assert_eq!(status, 415);
    assert!(!envelope.success);
    assert!(envelope.error.is_some());
}

#[tokio::test]
#[ignore]
async fn test_e2e_nearby_search() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    for fixture in TEST_REPORTS {
        submit_report(&client, &base_url, fixture, None)
            .await
            .expect("Failed to submit report");
    }

    let (lat, lon) = QUERY_POINT;
    let (status, envelope) = get_json::<NearbyResponse>(
        &client,
        &format!("{}/api/v1/reports/nearby?latitude={}&longitude={}&radius_km=5", base_url, lat, lon),
    )
    .await
    .expect("Nearby search failed");
    assert_eq!(status, 200);

    let nearby = envelope.data.expect("Missing data");
    assert!(nearby.reports.iter().all(|r| r.distance_km <= 5.0));
    assert!(nearby
        .reports
        .windows(2)
        .all(|w| w[0].distance_km <= w[1].distance_km));
    println!("  ✓ {} nearby reports, sorted by distance", nearby.count);

    let (status, _) = get_json::<Value>(
        &client,
        &format!("{}/api/v1/reports/nearby?latitude=95&longitude=0", base_url),
    )
    .await
    .expect("Request failed");
    assert_eq!(status, 400);
}

#[tokio::test]
#[ignore]
async fn test_e2e_signup_and_profile() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let email = unique_email();

    let signup = json!({
        "email": email,
        "password": "correct-horse-battery",
        "name": "Ana Santos",
        "health_conditions": ["asthma"],
        "barangay": "Quiapo",
        "city": "Manila"
    });
    let (status, envelope) = post_json::<Value>(&client, &format!("{}/api/v1/users", base_url), &signup)
        .await
        .expect("Signup failed");
    assert_eq!(status, 201);
    let user_id = envelope.data.expect("Missing data")["user_id"]
        .as_str()
        .expect("Missing user_id")
        .to_string();

    let (status, _) = post_json::<Value>(&client, &format!("{}/api/v1/users", base_url), &signup)
        .await
        .expect("Duplicate signup request failed");
    assert_eq!(status, 409);

    let response = client
        .put(format!("{}/api/v1/users/{}", base_url, user_id))
        .json(&json!({ "health_conditions": ["asthma", "copd"] }))
        .send()
        .await
        .expect("Profile update failed");
    assert_eq!(response.status().as_u16(), 200);

    let (status, envelope) = get_json::<Value>(&client, &format!("{}/api/v1/users/{}", base_url, user_id))
        .await
        .expect("Profile lookup failed");
    assert_eq!(status, 200);
    let profile = envelope.data.expect("Missing data");
    assert_eq!(profile["health_conditions"], json!(["asthma", "copd"]));
    assert_eq!(profile["barangay"], "Quiapo");
}

#[tokio::test]
#[ignore]
async fn test_e2e_voice_report_flow() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let (lat, lon) = QUERY_POINT;

    for transcription in VOICE_TRANSCRIPTIONS {
        let body = json!({
            "user_id": "e2e-user",
            "location": { "latitude": lat, "longitude": lon },
            "voice_transcription": transcription,
            "session_id": "e2e-session"
        });
        let (status, envelope) =
            post_json::<Value>(&client, &format!("{}/api/v1/assistant/voice-report", base_url), &body)
                .await
                .expect("Voice report failed");
        assert_eq!(status, 200);

        let data = envelope.data.expect("Missing data");
        assert!(data["report_id"].is_string());
        assert!(!data["tips"]["spoken_text"].as_str().unwrap_or_default().is_empty());
        println!(
            "  ✓ '{}' -> {} / {}",
            transcription, data["analysis"]["pollution_type"], data["analysis"]["severity"]
        );
    }
}

#[tokio::test]
#[ignore]
async fn test_e2e_voice_session_unknown_user() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();

    let body = json!({ "user_id": format!("missing-{}", uuid::Uuid::new_v4()) });
    let (status, envelope) =
        post_json::<Value>(&client, &format!("{}/api/v1/health/voice-session", base_url), &body)
            .await
            .expect("Request failed");

    assert_eq!(status, 404);
    assert_eq!(envelope.error.as_deref(), Some("User not found"));
}

#[tokio::test]
#[ignore]
async fn test_e2e_emergency_alert() {
    let base_url = get_base_url();
    let client = reqwest::Client::new();
    let (lat, lon) = QUERY_POINT;

    let body = json!({
        "user_id": "e2e-user",
        "location": { "latitude": lat, "longitude": lon },
        "pollution_report": { "pollution_type": "gas_emission", "distance_km": 0.3 }
    });
    let (status, envelope) =
        post_json::<Value>(&client, &format!("{}/api/v1/health/emergency-alert", base_url), &body)
            .await
            .expect("Emergency alert failed");
    assert_eq!(status, 200);

    let data = envelope.data.expect("Missing data");
    let message = data["message"].as_str().expect("Missing message");
    assert!(message.contains("0.3 kilometers"));
    assert!(data["audio_url"].as_str().is_some_and(|u| u.ends_with(".mp3")));
}
