use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics in Prometheus text exposition format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for every metric the server and worker emit.
pub fn describe_metrics() {
    metrics::describe_counter!("reports_created_total", "Pollution reports stored, by source");
    metrics::describe_counter!(
        "orchestration_steps_total",
        "Pipeline step outcomes, by step and outcome"
    );
    metrics::describe_counter!("orchestration_runs_total", "Finished orchestration runs, by aggregate status");
    metrics::describe_histogram!("orchestration_run_seconds", "Wall time of one orchestration run");
    metrics::describe_gauge!("orchestration_queue_depth", "Reports waiting for orchestration");
    metrics::describe_counter!("critical_alerts_total", "Critical report alerts published");
    metrics::describe_counter!(
        "assistant_fallbacks_total",
        "Assistant responses served from fallback text, by kind"
    );
    metrics::describe_counter!("geocode_requests_total", "Reverse geocoding lookups, by outcome");
    metrics::describe_counter!("tts_generated_total", "Advisory audio clips synthesized and published");
}
