use crate::models::report::{is_valid_coordinate, NearbyReport, PollutionReport};

/// Mean Earth radius used by the Haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Characters of a report's description carried into a nearby result.
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Great-circle distance in kilometers between two points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1_rad, lat2_rad) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Reports within `radius_km` of the query point, closest first.
///
/// Candidates without usable coordinates are ignored. Equal distances keep
/// their input order. Distances are rounded to two decimals only after
/// filtering and sorting.
///
/// The radius test uses the exact distance, so a reported `distance_km` can
/// round up past a radius that is not a multiple of 0.01 km (radius 1.006,
/// exact 1.0055, reported 1.01). Do not re-filter results on the rounded value.
pub fn find_nearby(
    query_lat: f64,
    query_lon: f64,
    candidates: &[PollutionReport],
    radius_km: f64,
    max_results: usize,
) -> Result<Vec<NearbyReport>, ProximityError> {
    if !is_valid_coordinate(query_lat, query_lon) {
        return Err(ProximityError::InvalidCoordinate {
            latitude: query_lat,
            longitude: query_lon,
        });
    }
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(ProximityError::InvalidRadius(radius_km));
    }
    if max_results == 0 {
        return Err(ProximityError::InvalidLimit);
    }

    let mut within: Vec<(f64, &PollutionReport)> = candidates
        .iter()
        .filter_map(|report| {
            let (lat, lon) = report.coordinates()?;
            let distance = haversine_km(query_lat, query_lon, lat, lon);
            (distance <= radius_km).then_some((distance, report))
        })
        .collect();

    // Vec::sort_by is stable
    within.sort_by(|a, b| a.0.total_cmp(&b.0));
    within.truncate(max_results);

    Ok(within
        .into_iter()
        .map(|(distance, report)| NearbyReport {
            report_id: report.id.clone(),
            pollution_type: report.pollution_type,
            severity: report.severity,
            distance_km: round2(distance),
            barangay: report.barangay.clone(),
            description: report.description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect(),
        })
        .collect())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProximityError {
    #[error("Invalid query coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Search radius must be a positive number of kilometers, got {0}")]
    InvalidRadius(f64),

    #[error("Maximum result count must be at least 1")]
    InvalidLimit,
}
