use metrics_exporter_prometheus::PrometheusBuilder;
use pollution_watch::{
    config::AppConfig,
    db::{self, reports::PgRecordStore, runs::PgRunSink},
    routes::metrics::describe_metrics,
    services::{
        alerts::RedisAlertPublisher,
        dispatcher::{DispatchError, ReportDispatcher},
        orchestrator::ReportOrchestrator,
        queue::ReportQueue,
        steps::{default_pipeline, HttpStepInvoker},
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting report orchestration worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    if let Some(addr) = &config.worker_metrics_addr {
        let addr: SocketAddr = addr.parse().expect("Invalid WORKER_METRICS_ADDR");
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .expect("Failed to install Prometheus exporter");
        describe_metrics();
        tracing::info!(%addr, "Worker metrics exporter listening");
    }

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let queue = ReportQueue::new(&config.redis_url).expect("Failed to initialize report queue");

    let orchestrator_config = config.orchestrator();
    let invoker =
        HttpStepInvoker::from_config(&orchestrator_config).expect("Failed to initialize step invoker");
    let alerts = RedisAlertPublisher::new(&config.redis_url, orchestrator_config.alert_channel.clone())
        .expect("Failed to initialize alert publisher");

    let pipeline = default_pipeline(&orchestrator_config);
    tracing::info!(
        steps = ?pipeline,
        fatal = ?orchestrator_config.fatal_steps,
        "Orchestration pipeline configured"
    );

    let queue = Arc::new(queue);
    let dispatcher = ReportDispatcher::new(
        queue.clone(),
        Arc::new(PgRecordStore::new(db_pool.clone())),
        ReportOrchestrator::new(
            pipeline,
            Arc::new(invoker),
            Arc::new(PgRunSink::new(db_pool)),
            Arc::new(alerts),
        ),
    );

    tracing::info!("Worker ready, starting processing loop");

    loop {
        if let Ok(depth) = queue.queue_depth().await {
            metrics::gauge!("orchestration_queue_depth").set(depth as f64);
        }

        match dispatcher.process_next().await {
            Ok(true) => {
                tracing::debug!("Report processed, checking for next event");
            }
            Ok(false) => {
                tracing::trace!("No reports queued, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(DispatchError::Load { report_id, source }) => {
                tracing::error!(%report_id, error = %source, "Failed to load queued report, event re-queued");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing report event, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}
