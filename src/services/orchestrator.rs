//! Report orchestration.
//!
//! A new report is pushed through a fixed, ordered pipeline of named steps.
//! Each step is served by an external service reached through a
//! [`StepInvoker`]. Step failures are recorded as data and never surface as
//! errors from [`ReportOrchestrator::run`]. The finished run is handed to a
//! [`RunSink`], and critical reports additionally go to an [`AlertSink`].

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::models::orchestration::{
    AggregateStatus, OrchestrationRun, ProcessingStep, RunSummary, StepOutcome, StepSummary,
};
use crate::models::report::{PollutionReport, Severity};

/// Predicate deciding whether a step applies to a report.
pub type StepPredicate = fn(&PollutionReport) -> bool;

/// One named stage of the pipeline.
#[derive(Clone)]
pub struct StepDefinition {
    pub name: String,
    pub predicate: Option<StepPredicate>,
    pub fatal: bool,
}

impl StepDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicate: None,
            fatal: false,
        }
    }

    /// Only run the step when `predicate` holds for the triggering report.
    pub fn when(mut self, predicate: StepPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// A failure of this step halts the remaining pipeline.
    pub fn fatal(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    fn applies_to(&self, report: &PollutionReport) -> bool {
        self.predicate.map_or(true, |p| p(report))
    }
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("conditional", &self.predicate.is_some())
            .field("fatal", &self.fatal)
            .finish()
    }
}

/// Calls the external service behind a named step.
///
/// Implementations own retries and per-call timeouts.
#[async_trait]
pub trait StepInvoker: Send + Sync {
    async fn invoke(
        &self,
        step_name: &str,
        report: &PollutionReport,
    ) -> Result<serde_json::Value, StepError>;
}

/// Durable storage of run history.
#[async_trait]
pub trait RunSink: Send + Sync {
    /// Record that processing of a report has begun.
    async fn mark_processing(&self, _report_id: &str) -> Result<(), SinkError> {
        Ok(())
    }

    async fn persist(&self, run: &OrchestrationRun) -> Result<(), SinkError>;
}

/// Best-effort notification channel for critical reports.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, summary: &RunSummary) -> Result<(), SinkError>;
}

pub struct ReportOrchestrator {
    pipeline: Vec<StepDefinition>,
    invoker: Arc<dyn StepInvoker>,
    run_sink: Arc<dyn RunSink>,
    alert_sink: Arc<dyn AlertSink>,
}

impl ReportOrchestrator {
    pub fn new(
        pipeline: Vec<StepDefinition>,
        invoker: Arc<dyn StepInvoker>,
        run_sink: Arc<dyn RunSink>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            pipeline,
            invoker,
            run_sink,
            alert_sink,
        }
    }

    pub fn pipeline(&self) -> &[StepDefinition] {
        &self.pipeline
    }

    /// Run the full pipeline for `report`.
    ///
    /// Only a report without an identifier is rejected; every other outcome,
    /// including all steps failing, is returned as a completed run.
    pub async fn run(&self, report: &PollutionReport) -> Result<OrchestrationRun, OrchestrationError> {
        if report.id.trim().is_empty() {
            return Err(OrchestrationError::MissingReportId);
        }

        let timer = Instant::now();
        let mut run = OrchestrationRun {
            report_id: report.id.clone(),
            started_at: Utc::now(),
            finished_at: None,
            steps: self
                .pipeline
                .iter()
                .map(|def| ProcessingStep {
                    name: def.name.clone(),
                    outcome: StepOutcome::Pending,
                })
                .collect(),
            status: AggregateStatus::Processing,
        };

        info!(report_id = %report.id, steps = self.pipeline.len(), "Starting report orchestration");

        if let Err(e) = self.run_sink.mark_processing(&report.id).await {
            warn!(report_id = %report.id, error = %e, "Failed to mark report as processing");
        }

        for (def, slot) in self.pipeline.iter().zip(run.steps.iter_mut()) {
            if !def.applies_to(report) {
                slot.outcome = StepOutcome::Skipped;
                record_step(&def.name, &slot.outcome);
                continue;
            }

            let halt = match self.invoker.invoke(&def.name, report).await {
                Ok(result) => {
                    slot.outcome = StepOutcome::Completed { result };
                    false
                }
                Err(e) => {
                    warn!(report_id = %report.id, step = %def.name, error = %e, "Pipeline step failed");
                    slot.outcome = StepOutcome::Failed {
                        error: e.to_string(),
                    };
                    def.fatal
                }
            };
            record_step(&def.name, &slot.outcome);

            if halt {
                error!(report_id = %report.id, step = %def.name, "Fatal step failed, halting pipeline");
                break;
            }
        }

        run.finished_at = Some(Utc::now());
        run.status = AggregateStatus::from_steps(&run.steps);

        metrics::counter!("orchestration_runs_total", "status" => run.status.to_string()).increment(1);
        metrics::histogram!("orchestration_run_seconds").record(timer.elapsed().as_secs_f64());

        if let Err(e) = self.run_sink.persist(&run).await {
            error!(report_id = %report.id, error = %e, "Failed to persist orchestration run");
        }

        if report.severity == Severity::Critical {
            let summary = summarize(report, &run);
            match self.alert_sink.notify(&summary).await {
                Ok(()) => {
                    metrics::counter!("critical_alerts_total").increment(1);
                    info!(report_id = %report.id, "Critical pollution alert sent");
                }
                Err(e) => error!(report_id = %report.id, error = %e, "Failed to send critical alert"),
            }
        }

        info!(
            report_id = %report.id,
            status = %run.status,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Orchestration completed"
        );

        Ok(run)
    }
}

fn record_step(name: &str, outcome: &StepOutcome) {
    metrics::counter!(
        "orchestration_steps_total",
        "step" => name.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);
}

/// Alert payload for a finished run.
pub fn summarize(report: &PollutionReport, run: &OrchestrationRun) -> RunSummary {
    RunSummary {
        alert_type: "CRITICAL_POLLUTION".to_string(),
        report_id: report.id.clone(),
        latitude: report.latitude,
        longitude: report.longitude,
        barangay: report.barangay.clone(),
        pollution_type: report.pollution_type,
        severity: report.severity,
        status: run.status,
        steps: run
            .steps
            .iter()
            .map(|s| StepSummary {
                name: s.name.clone(),
                outcome: s.outcome.label().to_string(),
            })
            .collect(),
        finished_at: run.finished_at,
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrchestrationError {
    #[error("Trigger report has no identifier")]
    MissingReportId,
}

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("No endpoint configured for step '{0}'")]
    NotConfigured(String),

    #[error("Step request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Step returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
