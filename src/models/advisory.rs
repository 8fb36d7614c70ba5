use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::report::{NearbyReport, PollutionType, Severity};

/// Reverse-geocoded description of a coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationDetails {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub barangay: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub place_id: Option<String>,
}

impl LocationDetails {
    /// Used whenever the geocoding service is unavailable or returns nothing.
    pub fn fallback(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            formatted_address: format!("{latitude}, {longitude}"),
            barangay: "Unknown".to_string(),
            city: "Unknown".to_string(),
            province: "Unknown".to_string(),
            country: "Philippines".to_string(),
            place_id: None,
        }
    }

    /// Most specific known place name.
    pub fn display_name(&self) -> &str {
        [self.barangay.as_str(), self.city.as_str()]
            .into_iter()
            .find(|s| !s.is_empty() && *s != "Unknown")
            .unwrap_or("your area")
    }
}

/// Pollution type and severity inferred from a spoken report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceAnalysis {
    pub pollution_type: PollutionType,
    pub severity: Severity,
    pub keywords: Vec<String>,
    pub confidence: f64,
}

impl VoiceAnalysis {
    pub fn empty() -> Self {
        Self {
            pollution_type: PollutionType::Unknown,
            severity: Severity::Medium,
            keywords: Vec::new(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeneratedBy {
    Model,
    Fallback,
}

/// Short spoken guidance for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpokenTips {
    pub spoken_text: String,
    pub severity: Severity,
    pub generated_by: GeneratedBy,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerReason {
    HighPollution,
    #[default]
    UserRequest,
    Emergency,
}

/// Health advice addressed to a specific user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAdvice {
    pub spoken_text: String,
    pub severity: Severity,
    pub generated_by: GeneratedBy,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
    VoiceSession,
    EmergencyAlert,
}

/// A stored advisory delivered to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAlert {
    pub alert_id: String,
    pub user_id: String,
    pub advice: String,
    pub severity: Severity,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub alert_type: AlertType,
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A bare coordinate pair as sent by the mobile client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// POST /api/v1/assistant/location-tips body.
#[derive(Debug, Deserialize, Validate)]
pub struct LocationTipsRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct LocationTipsResponse {
    pub location: LocationDetails,
    pub nearby_pollution: Vec<NearbyReport>,
    pub tips: SpokenTips,
}

/// POST /api/v1/assistant/voice-report body.
#[derive(Debug, Deserialize, Validate)]
pub struct VoiceReportRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(dive)]
    pub location: GeoPoint,

    #[serde(default)]
    #[garde(length(max = 4000))]
    pub voice_transcription: String,

    #[garde(length(max = 200))]
    pub session_id: Option<String>,

    #[garde(length(max = 500))]
    pub recording_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceReportResponse {
    pub report_id: String,
    pub location: LocationDetails,
    pub analysis: VoiceAnalysis,
    pub tips: SpokenTips,
    pub nearby_pollution: Vec<NearbyReport>,
}

/// POST /api/v1/health/voice-session body.
#[derive(Debug, Deserialize, Validate)]
pub struct VoiceSessionRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(dive)]
    pub location: Option<GeoPoint>,

    #[serde(default)]
    #[garde(skip)]
    pub trigger_reason: TriggerReason,
}

#[derive(Debug, Serialize)]
pub struct VoiceSessionResponse {
    pub alert_id: String,
    pub advice: HealthAdvice,
    pub audio_url: String,
    pub nearby_pollution: Vec<NearbyReport>,
}

/// POST /api/v1/health/advice body.
#[derive(Debug, Deserialize, Validate)]
pub struct AdviceRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(dive)]
    pub location: Option<GeoPoint>,

    #[serde(default)]
    #[garde(length(max = 1000))]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub spoken_text: String,
    pub audio_url: String,
}

/// The pollution event an emergency alert is about.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmergencyPollution {
    #[garde(skip)]
    pub pollution_type: PollutionType,

    #[garde(skip)]
    #[serde(default = "critical")]
    pub severity: Severity,

    #[garde(range(min = 0.0))]
    pub distance_km: f64,
}

fn critical() -> Severity {
    Severity::Critical
}

/// POST /api/v1/health/emergency-alert body.
#[derive(Debug, Deserialize, Validate)]
pub struct EmergencyAlertRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(dive)]
    pub location: Option<GeoPoint>,

    #[garde(dive)]
    pub pollution_report: EmergencyPollution,
}

#[derive(Debug, Serialize)]
pub struct EmergencyAlertResponse {
    pub alert_id: String,
    pub message: String,
    pub audio_url: String,
}
