use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pollution_watch::{
    app_state::{AppState, Collaborators},
    config::AppConfig,
    db, routes,
    services::{
        ai::WorkersAiClient, encryption::EncryptionService, geocoding::GoogleMapsGeocoder,
        identity::HttpIdentityProvider, queue::ReportQueue, storage::R2Client,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing pollution-watch server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe_metrics();

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let r2_client = R2Client::new(
        &config.r2_bucket,
        &config.r2_endpoint,
        &config.r2_access_key,
        &config.r2_secret_key,
        &config.media_public_base_url,
    )
    .expect("Failed to initialize R2 client");

    let encryption =
        EncryptionService::new(&config.encryption_key).expect("Failed to initialize encryption");

    let queue = ReportQueue::new(&config.redis_url).expect("Failed to initialize report queue");

    let ai = WorkersAiClient::new(
        &config.cf_account_id,
        &config.cf_api_token,
        &config.text_model,
        &config.tts_model,
    )
    .expect("Failed to initialize Workers AI client");

    let geocoder = GoogleMapsGeocoder::new(config.google_maps_api_key.clone())
        .expect("Failed to initialize geocoder");
    if config.google_maps_api_key.is_none() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set, locations will use coordinates only");
    }

    let identity = HttpIdentityProvider::new(
        config.identity_provider_url.clone(),
        config.identity_provider_token.clone(),
    )
    .expect("Failed to initialize identity provider client");
    if !identity.is_configured() {
        tracing::warn!("IDENTITY_PROVIDER_URL not set, signup stores profiles only");
    }

    let state = AppState::new(
        db_pool,
        r2_client,
        encryption,
        queue,
        Collaborators {
            ai,
            geocoder: Arc::new(geocoder),
            identity: Arc::new(identity),
        },
        config.proximity(),
    );

    let app = routes::router(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
