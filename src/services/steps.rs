use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::OrchestratorConfig;
use crate::models::report::PollutionReport;
use crate::services::orchestrator::{StepDefinition, StepError, StepInvoker};

pub const IMAGE_VERIFICATION: &str = "image-verification";
pub const ML_PREDICTION: &str = "ml-prediction";
pub const ADVISORY_GENERATION: &str = "advisory-generation";

/// The pipeline run for every new report.
///
/// 1. image verification, only for reports with a photo
/// 2. ML hotspot prediction
/// 3. health advisory generation, only for high and critical reports
pub fn default_pipeline(config: &OrchestratorConfig) -> Vec<StepDefinition> {
    let is_fatal = |name: &str| config.fatal_steps.iter().any(|s| s == name);

    vec![
        StepDefinition::new(IMAGE_VERIFICATION)
            .when(|r| r.image_url.as_deref().is_some_and(|url| !url.is_empty()))
            .fatal(is_fatal(IMAGE_VERIFICATION)),
        StepDefinition::new(ML_PREDICTION).fatal(is_fatal(ML_PREDICTION)),
        StepDefinition::new(ADVISORY_GENERATION)
            .when(|r| r.severity.is_elevated())
            .fatal(is_fatal(ADVISORY_GENERATION)),
    ]
}

/// Invokes each step by POSTing the report to the step's service endpoint.
pub struct HttpStepInvoker {
    http: Client,
    endpoints: HashMap<String, String>,
}

impl HttpStepInvoker {
    pub fn new(endpoints: HashMap<String, String>, timeout: Duration) -> Result<Self, StepError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoints })
    }

    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, StepError> {
        let endpoints = [
            (IMAGE_VERIFICATION, &config.image_verification_url),
            (ML_PREDICTION, &config.ml_prediction_url),
            (ADVISORY_GENERATION, &config.advisory_url),
        ]
        .into_iter()
        .filter_map(|(name, url)| url.clone().map(|u| (name.to_string(), u)))
        .collect();

        Self::new(endpoints, Duration::from_secs(config.step_timeout_secs))
    }
}

#[async_trait]
impl StepInvoker for HttpStepInvoker {
    async fn invoke(
        &self,
        step_name: &str,
        report: &PollutionReport,
    ) -> Result<serde_json::Value, StepError> {
        let url = self
            .endpoints
            .get(step_name)
            .ok_or_else(|| StepError::NotConfigured(step_name.to_string()))?;

        tracing::debug!(step = step_name, report_id = %report.id, "Invoking pipeline step");

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "step": step_name, "detail": report }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
