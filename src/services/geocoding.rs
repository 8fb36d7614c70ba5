use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::advisory::LocationDetails;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, GeocodeError>;
}

/// Reverse geocode, degrading to [`LocationDetails::fallback`] on any failure.
pub async fn locate(geocoder: &dyn Geocoder, latitude: f64, longitude: f64) -> LocationDetails {
    match geocoder.reverse(latitude, longitude).await {
        Ok(details) => {
            metrics::counter!("geocode_requests_total", "outcome" => "ok").increment(1);
            details
        }
        Err(e) => {
            metrics::counter!("geocode_requests_total", "outcome" => "fallback").increment(1);
            tracing::warn!(error = %e, latitude, longitude, "Reverse geocoding failed, using fallback location");
            LocationDetails::fallback(latitude, longitude)
        }
    }
}

/// Google Maps Geocoding API client.
pub struct GoogleMapsGeocoder {
    http: Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GoogleMapsGeocoder {
    pub fn new(api_key: Option<String>) -> Result<Self, GeocodeError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { http, api_key })
    }
}

#[async_trait]
impl Geocoder for GoogleMapsGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<LocationDetails, GeocodeError> {
        let api_key = self.api_key.as_deref().ok_or(GeocodeError::NotConfigured)?;

        let response: GeocodeResponse = self
            .http
            .get(GEOCODE_URL)
            .query(&[
                ("latlng", format!("{latitude},{longitude}")),
                ("key", api_key.to_string()),
                ("language", "en".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_response(response, latitude, longitude)
    }
}

fn parse_response(
    response: GeocodeResponse,
    latitude: f64,
    longitude: f64,
) -> Result<LocationDetails, GeocodeError> {
    if response.status != "OK" {
        return Err(GeocodeError::Status(response.status));
    }
    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::Status("ZERO_RESULTS".to_string()))?;

    let mut details = LocationDetails {
        latitude,
        longitude,
        formatted_address: result.formatted_address,
        barangay: String::new(),
        city: String::new(),
        province: String::new(),
        country: String::new(),
        place_id: result.place_id,
    };

    for component in result.address_components {
        let has = |t: &str| component.types.iter().any(|ty| ty == t);
        if has("neighborhood") || has("sublocality") {
            details.barangay = component.long_name;
        } else if has("locality") {
            details.city = component.long_name;
        } else if has("administrative_area_level_1") {
            details.province = component.long_name;
        } else if has("country") {
            details.country = component.long_name;
        }
    }

    Ok(details)
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Geocoding API key not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoding API returned status {0}")]
    Status(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GeocodeResponse {
        serde_json::from_value(serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "123 Rizal Ave, Manila, Metro Manila, Philippines",
                "place_id": "abc123",
                "address_components": [
                    { "long_name": "123", "types": ["street_number"] },
                    { "long_name": "San Jose", "types": ["sublocality", "political"] },
                    { "long_name": "Manila", "types": ["locality", "political"] },
                    { "long_name": "Metro Manila", "types": ["administrative_area_level_1"] },
                    { "long_name": "Philippines", "types": ["country", "political"] }
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_address_components() {
        let details = parse_response(sample(), 14.5995, 120.9842).unwrap();
        assert_eq!(details.barangay, "San Jose");
        assert_eq!(details.city, "Manila");
        assert_eq!(details.province, "Metro Manila");
        assert_eq!(details.country, "Philippines");
        assert_eq!(details.place_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_non_ok_status_is_error() {
        let response: GeocodeResponse =
            serde_json::from_value(serde_json::json!({ "status": "REQUEST_DENIED" })).unwrap();
        assert!(matches!(
            parse_response(response, 0.0, 0.0),
            Err(GeocodeError::Status(s)) if s == "REQUEST_DENIED"
        ));
    }

    #[tokio::test]
    async fn test_locate_falls_back_without_key() {
        let geocoder = GoogleMapsGeocoder::new(None).unwrap();
        let details = locate(&geocoder, 14.5995, 120.9842).await;
        assert_eq!(details, LocationDetails::fallback(14.5995, 120.9842));
    }
}
