use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the report event queue and alert channel
    pub redis_url: String,

    /// Cloudflare account ID
    pub cf_account_id: String,

    /// Cloudflare Workers AI API token
    pub cf_api_token: String,

    /// Workers AI text generation model
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Workers AI text-to-speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// R2 bucket name
    pub r2_bucket: String,

    /// R2 access key ID (S3-compatible)
    pub r2_access_key: String,

    /// R2 secret access key (S3-compatible)
    pub r2_secret_key: String,

    /// R2 endpoint URL
    pub r2_endpoint: String,

    /// Public URL prefix for objects in the media bucket
    pub media_public_base_url: String,

    /// AES-256-GCM encryption key (base64-encoded, 32 bytes)
    pub encryption_key: String,

    /// Google Maps Geocoding API key. Without it every lookup uses the fallback location.
    #[serde(default)]
    pub google_maps_api_key: Option<String>,

    /// Admin endpoint of the identity provider used at signup
    #[serde(default)]
    pub identity_provider_url: Option<String>,

    #[serde(default)]
    pub identity_provider_token: Option<String>,

    /// Endpoint of the image verification step
    #[serde(default)]
    pub image_verification_url: Option<String>,

    /// Endpoint of the ML hotspot prediction step
    #[serde(default)]
    pub ml_prediction_url: Option<String>,

    /// Endpoint of the health advisory step
    #[serde(default)]
    pub advisory_url: Option<String>,

    /// Per-call timeout for pipeline step invocations
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// Comma-separated step names whose failure halts the pipeline
    #[serde(default)]
    pub orchestrator_fatal_steps: String,

    /// Redis pub/sub channel for critical pollution alerts
    #[serde(default = "default_alert_channel")]
    pub alert_channel: String,

    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,

    #[serde(default = "default_nearby_max_results")]
    pub nearby_max_results: usize,

    /// Number of stored reports scanned per nearby query
    #[serde(default = "default_candidate_scan_limit")]
    pub candidate_scan_limit: i64,

    /// Address for the worker's own Prometheus scrape endpoint. Unset disables it.
    #[serde(default)]
    pub worker_metrics_addr: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_text_model() -> String {
    "@cf/meta/llama-3.1-8b-instruct".to_string()
}

fn default_tts_model() -> String {
    "@cf/myshell-ai/melotts".to_string()
}

fn default_step_timeout_secs() -> u64 {
    30
}

fn default_alert_channel() -> String {
    "pollution:alerts".to_string()
}

fn default_nearby_radius_km() -> f64 {
    5.0
}

fn default_nearby_max_results() -> usize {
    10
}

fn default_candidate_scan_limit() -> i64 {
    100
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every nearby lookup or step call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.nearby_radius_km.is_finite() && self.nearby_radius_km > 0.0) {
            return Err(ConfigError::Invalid {
                name: "NEARBY_RADIUS_KM",
                reason: format!("must be a positive number of kilometers, got {}", self.nearby_radius_km),
            });
        }
        if self.nearby_max_results == 0 {
            return Err(ConfigError::Invalid {
                name: "NEARBY_MAX_RESULTS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.candidate_scan_limit <= 0 {
            return Err(ConfigError::Invalid {
                name: "CANDIDATE_SCAN_LIMIT",
                reason: format!("must be at least 1, got {}", self.candidate_scan_limit),
            });
        }
        if self.step_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "STEP_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn proximity(&self) -> ProximityConfig {
        ProximityConfig {
            radius_km: self.nearby_radius_km,
            max_results: self.nearby_max_results,
            scan_limit: self.candidate_scan_limit,
        }
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            fatal_steps: parse_step_list(&self.orchestrator_fatal_steps),
            step_timeout_secs: self.step_timeout_secs,
            alert_channel: self.alert_channel.clone(),
            image_verification_url: self.image_verification_url.clone(),
            ml_prediction_url: self.ml_prediction_url.clone(),
            advisory_url: self.advisory_url.clone(),
        }
    }
}

/// Defaults for nearby-pollution lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityConfig {
    pub radius_km: f64,
    pub max_results: usize,
    pub scan_limit: i64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_km: default_nearby_radius_km(),
            max_results: default_nearby_max_results(),
            scan_limit: default_candidate_scan_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorConfig {
    pub fatal_steps: Vec<String>,
    pub step_timeout_secs: u64,
    pub alert_channel: String,
    pub image_verification_url: Option<String>,
    pub ml_prediction_url: Option<String>,
    pub advisory_url: Option<String>,
}

fn parse_step_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
