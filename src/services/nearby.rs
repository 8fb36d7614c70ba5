use async_trait::async_trait;

use crate::config::ProximityConfig;
use crate::models::report::{NearbyReport, PollutionReport};
use crate::services::proximity::{find_nearby, ProximityError};

/// Read access to stored reports.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Most recent reports, newest first, up to `limit`.
    async fn fetch_candidates(&self, limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error>;

    async fn fetch_by_id(&self, id: &str) -> Result<Option<PollutionReport>, sqlx::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum NearbyError {
    #[error(transparent)]
    Proximity(#[from] ProximityError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Nearby search over the most recent stored reports.
pub async fn search(
    store: &dyn RecordStore,
    config: &ProximityConfig,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    max_results: usize,
) -> Result<Vec<NearbyReport>, NearbyError> {
    let candidates = store.fetch_candidates(config.scan_limit).await?;
    Ok(find_nearby(latitude, longitude, &candidates, radius_km, max_results)?)
}

/// Nearby search with the configured defaults, yielding an empty list on
/// any failure. Used by the assistant flows, which must always answer.
pub async fn nearby_or_empty(
    store: &dyn RecordStore,
    config: &ProximityConfig,
    latitude: f64,
    longitude: f64,
) -> Vec<NearbyReport> {
    match search(store, config, latitude, longitude, config.radius_km, config.max_results).await {
        Ok(nearby) => nearby,
        Err(e) => {
            tracing::warn!(error = %e, latitude, longitude, "Nearby lookup failed, continuing without it");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{PollutionType, ReportSource, Severity};
    use chrono::Utc;

    struct MemoryStore(Vec<PollutionReport>);

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn fetch_candidates(&self, limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error> {
            Ok(self.0.iter().take(limit as usize).cloned().collect())
        }

        async fn fetch_by_id(&self, id: &str) -> Result<Option<PollutionReport>, sqlx::Error> {
            Ok(self.0.iter().find(|r| r.id == id).cloned())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl RecordStore for BrokenStore {
        async fn fetch_candidates(&self, _limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }

        async fn fetch_by_id(&self, _id: &str) -> Result<Option<PollutionReport>, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    fn report(id: &str, lat: f64, lon: f64) -> PollutionReport {
        PollutionReport {
            id: id.to_string(),
            user_id: "u1".to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
            address: String::new(),
            barangay: "San Jose".to_string(),
            city: "Manila".to_string(),
            pollution_type: PollutionType::Waste,
            severity: Severity::Medium,
            description: String::new(),
            image_url: None,
            source: ReportSource::MobileApp,
            status: "pending".to_string(),
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_scan_limit_bounds_candidates() {
        let store = MemoryStore(vec![
            report("a", 14.6000, 120.9842),
            report("b", 14.5995, 120.9842),
        ]);
        let config = ProximityConfig {
            scan_limit: 1,
            ..ProximityConfig::default()
        };

        let nearby = search(&store, &config, 14.5995, 120.9842, 5.0, 10).await.unwrap();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].report_id, "a");
    }

    #[tokio::test]
    async fn test_invalid_query_is_error() {
        let store = MemoryStore(vec![]);
        let result = search(&store, &ProximityConfig::default(), 95.0, 0.0, 5.0, 10).await;
        assert!(matches!(result, Err(NearbyError::Proximity(_))));
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty() {
        let nearby = nearby_or_empty(&BrokenStore, &ProximityConfig::default(), 14.6, 121.0).await;
        assert!(nearby.is_empty());
    }
}
