use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::str::FromStr;

use crate::models::report::{PollutionReport, ReportFilter};
use crate::services::nearby::RecordStore;

const REPORT_COLUMNS: &str = "id, user_id, latitude, longitude, address, barangay, city, \
     pollution_type, severity, description, image_url, source, status, is_verified, created_at";

pub const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 500;

/// Voice-session metadata stored alongside reports created by the assistant.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoiceMetadata<'a> {
    pub session_id: Option<&'a str>,
    pub recording_url: Option<&'a str>,
}

/// Insert a new report
pub async fn insert_report(
    pool: &PgPool,
    report: &PollutionReport,
    voice: VoiceMetadata<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reports (id, user_id, latitude, longitude, address, barangay, city,
                             pollution_type, severity, description, image_url, source,
                             status, is_verified, session_id, recording_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(&report.id)
    .bind(&report.user_id)
    .bind(report.latitude)
    .bind(report.longitude)
    .bind(&report.address)
    .bind(&report.barangay)
    .bind(&report.city)
    .bind(report.pollution_type.to_string())
    .bind(report.severity.to_string())
    .bind(&report.description)
    .bind(&report.image_url)
    .bind(report.source.to_string())
    .bind(&report.status)
    .bind(report.is_verified)
    .bind(voice.session_id)
    .bind(voice.recording_url)
    .bind(report.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a report by ID
pub async fn get_report(pool: &PgPool, id: &str) -> Result<Option<PollutionReport>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// Reports matching `filter`, newest first.
pub async fn list_reports(pool: &PgPool, filter: &ReportFilter) -> Result<Vec<PollutionReport>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM reports WHERE TRUE"));

    if let Some(barangay) = &filter.barangay {
        query.push(" AND barangay = ").push_bind(barangay.clone());
    }
    if let Some(kind) = filter.pollution_type {
        query.push(" AND pollution_type = ").push_bind(kind.to_string());
    }
    if let Some(severity) = filter.severity {
        query.push(" AND severity = ").push_bind(severity.to_string());
    }

    let limit = filter
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    query.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(report_from_row).collect()
}

/// Most recent reports, the candidate set for nearby searches.
pub async fn recent_reports(pool: &PgPool, limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(report_from_row).collect()
}

/// Update report processing status
pub async fn update_report_status(pool: &PgPool, id: &str, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE reports SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

fn report_from_row(row: &PgRow) -> Result<PollutionReport, sqlx::Error> {
    Ok(PollutionReport {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        address: row.try_get("address")?,
        barangay: row.try_get("barangay")?,
        city: row.try_get("city")?,
        pollution_type: decode_enum(row, "pollution_type")?,
        severity: decode_enum(row, "severity")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        source: decode_enum(row, "source")?,
        status: row.try_get("status")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Decode a text column through the enum's `FromStr`.
pub(crate) fn decode_enum<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    T::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// [`RecordStore`] backed by the `reports` table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn fetch_candidates(&self, limit: i64) -> Result<Vec<PollutionReport>, sqlx::Error> {
        recent_reports(&self.pool, limit).await
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<PollutionReport>, sqlx::Error> {
        get_report(&self.pool, id).await
    }
}
