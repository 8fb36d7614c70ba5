//! Test helper utilities for E2E testing

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::fixtures::TestReportFixture;

/// `{"success": ..., "data": ..., "error": ...}` response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Response from POST /api/v1/reports
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedReport {
    pub report_id: String,
    pub image_url: Option<String>,
    pub status: String,
}

/// Step entry in GET /api/v1/reports/{report_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct StepEntry {
    pub name: String,
    pub status: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Processing {
    pub status: String,
    pub steps: Vec<StepEntry>,
}

/// Response from GET /api/v1/reports/{report_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportDetail {
    pub report: Value,
    pub processing: Option<Processing>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NearbyEntry {
    pub report_id: String,
    pub severity: String,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NearbyResponse {
    pub count: usize,
    pub reports: Vec<NearbyEntry>,
}

/// POST a JSON body and decode the envelope, returning the HTTP status too.
pub async fn post_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    body: &Value,
) -> Result<(u16, Envelope<T>), Box<dyn std::error::Error>> {
    let response = client.post(url).json(body).send().await?;
    let status = response.status().as_u16();
    Ok((status, response.json::<Envelope<T>>().await?))
}

/// GET a URL and decode the envelope, returning the HTTP status too.
pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<(u16, Envelope<T>), Box<dyn std::error::Error>> {
    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    Ok((status, response.json::<Envelope<T>>().await?))
}

/// Submit a fixture report, optionally with a photo
pub async fn submit_report(
    client: &reqwest::Client,
    base_url: &str,
    fixture: &TestReportFixture,
    image_base64: Option<&str>,
) -> Result<CreatedReport, Box<dyn std::error::Error>> {
    let mut body = json!({
        "user_id": "e2e-user",
        "location": {
            "latitude": fixture.latitude,
            "longitude": fixture.longitude,
            "barangay": fixture.barangay,
            "city": "Manila"
        },
        "pollution_type": fixture.pollution_type,
        "severity": fixture.severity,
        "description": fixture.description
    });
    if let Some(image) = image_base64 {
        body["image_base64"] = json!(image);
    }

    let (status, envelope) =
        post_json::<CreatedReport>(client, &format!("{}/api/v1/reports", base_url), &body).await?;
    if status != 201 {
        return Err(format!("Report creation failed with status {}: {:?}", status, envelope.error).into());
    }

    envelope.data.ok_or_else(|| "Missing data in response".into())
}

/// Poll a report until the worker has recorded an orchestration run
pub async fn wait_for_orchestration(
    client: &reqwest::Client,
    base_url: &str,
    report_id: &str,
    timeout_secs: u64,
) -> Result<Processing, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let (status, envelope) =
            get_json::<ReportDetail>(client, &format!("{}/api/v1/reports/{}", base_url, report_id)).await?;
        if status != 200 {
            return Err(format!("Report lookup failed: {:?}", envelope.error).into());
        }

        if let Some(processing) = envelope.data.and_then(|d| d.processing) {
            return Ok(processing);
        }

        if attempt % 10 == 0 && attempt > 0 {
            println!("  ... still waiting (attempt {}/{})", attempt, max_attempts);
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(format!("Report was not orchestrated within {} seconds", timeout_secs).into())
}

/// Assert the step list of a finished run is internally consistent
pub fn assert_run_consistent(processing: &Processing, has_image: bool, elevated: bool) {
    let step = |name: &str| {
        processing
            .steps
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("Missing step {}", name))
    };

    assert_eq!(processing.steps.len(), 3, "Every pipeline step must be reported");

    if !has_image {
        assert_eq!(step("image-verification").status, "skipped");
    }
    if !elevated {
        assert_eq!(step("advisory-generation").status, "skipped");
    }

    let any_completed = processing.steps.iter().any(|s| s.status == "completed");
    let any_failed = processing.steps.iter().any(|s| s.status == "failed");
    let expected = match (any_completed, any_failed) {
        (_, false) => "processed",
        (false, true) => "failed",
        (true, true) => "partially_processed",
    };
    assert_eq!(processing.status, expected);

    println!("  ✓ run status {} with {} steps", processing.status, processing.steps.len());
}
