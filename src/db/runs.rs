use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::db::reports::update_report_status;
use crate::models::orchestration::{AggregateStatus, OrchestrationRun, ProcessingStep};
use crate::services::orchestrator::{RunSink, SinkError};

/// [`RunSink`] writing run history to `orchestration_runs` and the
/// aggregate status back onto the report.
#[derive(Clone)]
pub struct PgRunSink {
    pool: PgPool,
}

impl PgRunSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunSink for PgRunSink {
    async fn mark_processing(&self, report_id: &str) -> Result<(), SinkError> {
        update_report_status(&self.pool, report_id, &AggregateStatus::Processing.to_string()).await?;
        Ok(())
    }

    async fn persist(&self, run: &OrchestrationRun) -> Result<(), SinkError> {
        let steps = serde_json::to_value(&run.steps)?;
        let status = run.status.to_string();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO orchestration_runs (report_id, status, steps, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&run.report_id)
        .bind(&status)
        .bind(steps)
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE reports SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(&status)
            .bind(&run.report_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Latest persisted run for a report.
pub async fn latest_run(pool: &PgPool, report_id: &str) -> Result<Option<(String, Vec<ProcessingStep>)>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT status, steps
        FROM orchestration_runs
        WHERE report_id = $1
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(report_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        let status: String = r.try_get("status")?;
        let steps: serde_json::Value = r.try_get("steps")?;
        let steps = serde_json::from_value(steps).map_err(|e| sqlx::Error::ColumnDecode {
            index: "steps".to_string(),
            source: Box::new(e),
        })?;
        Ok((status, steps))
    })
    .transpose()
}
