use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod assistant;
pub mod error;
pub mod extract;
pub mod health;
pub mod health_advice;
pub mod metrics;
pub mod reports;
pub mod users;

/// Report photos arrive base64-encoded inside JSON bodies.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: AppState, prometheus: Arc<PrometheusHandle>) -> Router {
    let api = Router::new()
        .route("/users", post(users::signup))
        .route("/users/{user_id}", get(users::get_profile).put(users::update_profile))
        .route("/users/{user_id}/alerts", get(users::list_alerts))
        .route("/reports", post(reports::create_report).get(reports::list_reports))
        .route("/reports/nearby", get(reports::nearby_reports))
        .route("/reports/{report_id}", get(reports::get_report))
        .route("/assistant/location-tips", post(assistant::location_tips))
        .route("/assistant/voice-report", post(assistant::voice_report))
        .route("/health/voice-session", post(health_advice::voice_session))
        .route("/health/advice", post(health_advice::advice))
        .route("/health/emergency-alert", post(health_advice::emergency_alert));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .with_state(state)
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(prometheus),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}
