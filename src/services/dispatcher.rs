use std::sync::Arc;

use async_trait::async_trait;

use crate::services::nearby::RecordStore;
use crate::services::orchestrator::ReportOrchestrator;
use crate::services::queue::{QueueError, ReportEvent, ReportQueue};

/// Queue operations the dispatcher needs.
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn dequeue(&self) -> Result<Option<ReportEvent>, QueueError>;

    /// Acknowledge an event; it will not be seen again.
    async fn complete(&self, event: &ReportEvent) -> Result<(), QueueError>;

    /// Hand an in-flight event back for a later attempt.
    async fn requeue(&self, event: &ReportEvent) -> Result<(), QueueError>;
}

#[async_trait]
impl EventQueue for ReportQueue {
    async fn dequeue(&self) -> Result<Option<ReportEvent>, QueueError> {
        ReportQueue::dequeue(self).await
    }

    async fn complete(&self, event: &ReportEvent) -> Result<(), QueueError> {
        ReportQueue::complete(self, event).await
    }

    async fn requeue(&self, event: &ReportEvent) -> Result<(), QueueError> {
        ReportQueue::requeue(self, event).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Failed to load report {report_id}: {source}")]
    Load {
        report_id: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Moves queued report events through the orchestrator.
///
/// Events are acknowledged once a run has been recorded, or when they can
/// never produce one (report deleted, run rejected). A store failure leaves
/// the run undone, so the event goes back on the queue.
pub struct ReportDispatcher {
    queue: Arc<dyn EventQueue>,
    records: Arc<dyn RecordStore>,
    orchestrator: ReportOrchestrator,
}

impl ReportDispatcher {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        records: Arc<dyn RecordStore>,
        orchestrator: ReportOrchestrator,
    ) -> Self {
        Self {
            queue,
            records,
            orchestrator,
        }
    }

    /// Handle the next queued event.
    /// Returns Ok(true) if an event was handled, Ok(false) if the queue was empty.
    pub async fn process_next(&self) -> Result<bool, DispatchError> {
        let Some(event) = self.queue.dequeue().await? else {
            return Ok(false);
        };

        if let Err(e) = self.handle(&event).await {
            self.queue.requeue(&event).await?;
            return Err(e);
        }

        self.queue.complete(&event).await?;
        Ok(true)
    }

    async fn handle(&self, event: &ReportEvent) -> Result<(), DispatchError> {
        let report = match self.records.fetch_by_id(&event.report_id).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                tracing::warn!(report_id = %event.report_id, "Queued report no longer exists, dropping event");
                return Ok(());
            }
            Err(source) => {
                return Err(DispatchError::Load {
                    report_id: event.report_id.clone(),
                    source,
                })
            }
        };

        let lag_ms = (chrono::Utc::now() - event.created_at).num_milliseconds();
        tracing::info!(report_id = %report.id, queue_lag_ms = lag_ms, "Orchestrating report");

        match self.orchestrator.run(&report).await {
            Ok(run) => tracing::info!(
                report_id = %run.report_id,
                status = %run.status,
                "Report orchestration finished"
            ),
            Err(e) => tracing::error!(report_id = %report.id, error = %e, "Report rejected by orchestrator"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::orchestration::{OrchestrationRun, RunSummary};
    use crate::models::report::{PollutionReport, PollutionType, ReportSource, Severity};
    use crate::services::orchestrator::{AlertSink, RunSink, SinkError, StepError, StepInvoker};
    use crate::services::steps::default_pipeline;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryQueue {
        pending: Mutex<VecDeque<ReportEvent>>,
        completed: Mutex<Vec<String>>,
        requeued: Mutex<Vec<String>>,
    }

    impl MemoryQueue {
        fn with(report_id: &str) -> Self {
            let queue = Self::default();
            queue.pending.lock().unwrap().push_back(ReportEvent {
                report_id: report_id.to_string(),
                created_at: Utc::now(),
            });
            queue
        }
    }

    #[async_trait]
    impl EventQueue for MemoryQueue {
        async fn dequeue(&self) -> Result<Option<ReportEvent>, QueueError> {
            Ok(self.pending.lock().unwrap().pop_front())
        }

        async fn complete(&self, event: &ReportEvent) -> Result<(), QueueError> {
            self.completed.lock().unwrap().push(event.report_id.clone());
            Ok(())
        }

        async fn requeue(&self, event: &ReportEvent) -> Result<(), QueueError> {
            self.requeued.lock().unwrap().push(event.report_id.clone());
            self.pending.lock().unwrap().push_back(event.clone());
            Ok(())
        }
    }

    enum Store {
        Holding(PollutionReport),
        Empty,
        Down,
    }

    #[async_trait]
    impl RecordStore for Store {
        async fn fetch_candidates(&self, _limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error> {
            Ok(Vec::new())
        }

        async fn fetch_by_id(&self, id: &str) -> Result<Option<PollutionReport>, sqlx::Error> {
            match self {
                Store::Holding(report) if report.id == id => Ok(Some(report.clone())),
                Store::Holding(_) | Store::Empty => Ok(None),
                Store::Down => Err(sqlx::Error::PoolTimedOut),
            }
        }
    }

    struct Echo;

    #[async_trait]
    impl StepInvoker for Echo {
        async fn invoke(&self, step_name: &str, _report: &PollutionReport) -> Result<serde_json::Value, StepError> {
            Ok(serde_json::json!({ "step": step_name }))
        }
    }

    #[derive(Default)]
    struct Runs(Mutex<Vec<OrchestrationRun>>);

    #[async_trait]
    impl RunSink for Runs {
        async fn persist(&self, run: &OrchestrationRun) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(run.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl AlertSink for Runs {
        async fn notify(&self, _summary: &RunSummary) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn report(id: &str) -> PollutionReport {
        PollutionReport {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            latitude: Some(14.5995),
            longitude: Some(120.9842),
            address: String::new(),
            barangay: String::new(),
            city: String::new(),
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

    fn dispatcher(queue: Arc<MemoryQueue>, store: Store, runs: Arc<Runs>) -> ReportDispatcher {
        let orchestrator = ReportOrchestrator::new(
            default_pipeline(&Default::default()),
            Arc::new(Echo),
            runs.clone(),
            runs,
        );
        ReportDispatcher::new(queue, Arc::new(store), orchestrator)
    }

    #[tokio::test]
    async fn test_orchestrated_event_is_completed() {
        let queue = Arc::new(MemoryQueue::with("r-1"));
        let runs = Arc::new(Runs::default());
        let dispatcher = dispatcher(queue.clone(), Store::Holding(report("r-1")), runs.clone());

        assert!(dispatcher.process_next().await.unwrap());
        assert_eq!(*queue.completed.lock().unwrap(), vec!["r-1"]);
        assert!(queue.requeued.lock().unwrap().is_empty());
        assert_eq!(runs.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_requeues_instead_of_completing() {
        let queue = Arc::new(MemoryQueue::with("r-1"));
        let runs = Arc::new(Runs::default());
        let dispatcher = dispatcher(queue.clone(), Store::Down, runs.clone());

        let err = dispatcher.process_next().await.unwrap_err();
        assert!(matches!(err, DispatchError::Load { ref report_id, .. } if report_id == "r-1"));

        assert!(queue.completed.lock().unwrap().is_empty());
        assert_eq!(*queue.requeued.lock().unwrap(), vec!["r-1"]);
        assert_eq!(queue.pending.lock().unwrap().len(), 1);
        assert!(runs.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_report_is_dropped() {
        let queue = Arc::new(MemoryQueue::with("gone"));
        let runs = Arc::new(Runs::default());
        let dispatcher = dispatcher(queue.clone(), Store::Empty, runs.clone());

        assert!(dispatcher.process_next().await.unwrap());
        assert_eq!(*queue.completed.lock().unwrap(), vec!["gone"]);
        assert!(queue.requeued.lock().unwrap().is_empty());
        assert!(runs.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let queue = Arc::new(MemoryQueue::default());
        let dispatcher = dispatcher(queue, Store::Empty, Arc::new(Runs::default()));
        assert!(!dispatcher.process_next().await.unwrap());
    }
}
