use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reported severity, ordered from least to most serious.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and critical reports warrant health advisories.
    pub fn is_elevated(self) -> bool {
        self >= Severity::High
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PollutionType {
    GasEmission,
    AirQuality,
    Waste,
    WaterPollution,
    Fire,
    Noise,
    Other,
    Unknown,
}

/// Where a report came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportSource {
    MobileApp,
    Voice,
}

/// A stored pollution report.
///
/// Coordinates are optional at the storage layer; a report without valid
/// coordinates never shows up in nearby searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollutionReport {
    pub id: String,
    pub user_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    pub barangay: String,
    pub city: String,
    pub pollution_type: PollutionType,
    pub severity: Severity,
    pub description: String,
    pub image_url: Option<String>,
    pub source: ReportSource,
    pub status: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl PollutionReport {
    /// Coordinates if both are present, finite and within geographic range.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => Some((lat, lon)),
            _ => None,
        }
    }
}

pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// A report within range of a query point, with its distance in kilometers
/// rounded to two decimals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyReport {
    pub report_id: String,
    pub pollution_type: PollutionType,
    pub severity: Severity,
    pub distance_km: f64,
    pub barangay: String,
    pub description: String,
}

/// Location supplied with a new report.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReportLocationInput {
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[garde(length(max = 300))]
    pub address: Option<String>,

    #[garde(length(max = 120))]
    pub barangay: Option<String>,

    #[garde(length(max = 120))]
    pub city: Option<String>,
}

/// POST /api/v1/reports body.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[garde(length(min = 1, max = 128))]
    pub user_id: String,

    #[garde(dive)]
    pub location: ReportLocationInput,

    #[garde(skip)]
    pub pollution_type: PollutionType,

    #[garde(skip)]
    pub severity: Severity,

    #[garde(length(max = 2000))]
    pub description: Option<String>,

    /// Base64-encoded photo (JPEG, PNG or WebP).
    #[garde(skip)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    pub report_id: String,
    pub created_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub status: String,
}

/// Query string for GET /api/v1/reports.
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub barangay: Option<String>,
    pub pollution_type: Option<PollutionType>,
    pub severity: Option<Severity>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReportList {
    pub count: usize,
    pub reports: Vec<PollutionReport>,
}

/// Query string for GET /api/v1/reports/nearby.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::Critical.is_elevated());
        assert!(!Severity::Medium.is_elevated());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(Severity::from_str("HIGH").unwrap(), Severity::High);
        assert_eq!(
            PollutionType::from_str("water_pollution").unwrap(),
            PollutionType::WaterPollution
        );
        assert_eq!(PollutionType::GasEmission.to_string(), "gas_emission");
        assert!(Severity::from_str("extreme").is_err());
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(is_valid_coordinate(14.5995, 120.9842));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(!is_valid_coordinate(91.0, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.5));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
    }

    #[test]
    fn test_create_request_validation() {
        let body = serde_json::json!({
            "user_id": "user-1",
            "location": { "latitude": 120.0, "longitude": 14.0 },
            "pollution_type": "waste",
            "severity": "low"
        });
        let req: CreateReportRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }
}
