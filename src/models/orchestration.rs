use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::report::{PollutionType, Severity};

/// Outcome of one pipeline step within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Pending,
    Completed { result: serde_json::Value },
    Failed { error: String },
    Skipped,
}

impl StepOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Pending => "pending",
            StepOutcome::Completed { .. } => "completed",
            StepOutcome::Failed { .. } => "failed",
            StepOutcome::Skipped => "skipped",
        }
    }

    /// Whether the step was actually invoked.
    pub fn executed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. } | StepOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingStep {
    pub name: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Report status derived from step outcomes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregateStatus {
    Processing,
    Processed,
    PartiallyProcessed,
    Failed,
}

impl AggregateStatus {
    /// Derive the terminal status from the recorded step outcomes.
    ///
    /// Skipped and never-started steps do not count. A run where nothing
    /// executed is treated as processed.
    pub fn from_steps(steps: &[ProcessingStep]) -> Self {
        let mut completed = 0usize;
        let mut failed = 0usize;
        for step in steps {
            match step.outcome {
                StepOutcome::Completed { .. } => completed += 1,
                StepOutcome::Failed { .. } => failed += 1,
                StepOutcome::Pending | StepOutcome::Skipped => {}
            }
        }

        match (completed, failed) {
            (_, 0) => AggregateStatus::Processed,
            (0, _) => AggregateStatus::Failed,
            _ => AggregateStatus::PartiallyProcessed,
        }
    }
}

/// One orchestration pass over a newly created report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRun {
    pub report_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<ProcessingStep>,
    pub status: AggregateStatus,
}

impl OrchestrationRun {
    pub fn step(&self, name: &str) -> Option<&ProcessingStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Payload published for critical reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub alert_type: String,
    pub report_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub barangay: String,
    pub pollution_type: PollutionType,
    pub severity: Severity,
    pub status: AggregateStatus,
    pub steps: Vec<StepSummary>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub name: String,
    pub outcome: String,
}
