use chrono::Duration;
use sqlx::{PgPool, Row};

use crate::db::reports::decode_enum;
use crate::models::advisory::HealthAlert;

/// How long a stored advisory stays relevant.
pub const ALERT_TTL_DAYS: i64 = 7;

/// Expiry for an alert created at `created_at`.
pub fn expiry_for(created_at: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    created_at + Duration::days(ALERT_TTL_DAYS)
}

/// Insert a health alert
pub async fn insert_alert(pool: &PgPool, alert: &HealthAlert) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO health_alerts (alert_id, user_id, advice, severity, latitude, longitude,
                                   alert_type, audio_url, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&alert.alert_id)
    .bind(&alert.user_id)
    .bind(&alert.advice)
    .bind(alert.severity.to_string())
    .bind(alert.latitude)
    .bind(alert.longitude)
    .bind(alert.alert_type.to_string())
    .bind(&alert.audio_url)
    .bind(alert.created_at)
    .bind(alert.expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Unexpired alerts for a user, newest first.
pub async fn active_alerts(pool: &PgPool, user_id: &str) -> Result<Vec<HealthAlert>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT alert_id, user_id, advice, severity, latitude, longitude, alert_type,
               audio_url, created_at, expires_at
        FROM health_alerts
        WHERE user_id = $1 AND expires_at > NOW()
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| {
            Ok(HealthAlert {
                alert_id: r.try_get("alert_id")?,
                user_id: r.try_get("user_id")?,
                advice: r.try_get("advice")?,
                severity: decode_enum(r, "severity")?,
                latitude: r.try_get("latitude")?,
                longitude: r.try_get("longitude")?,
                alert_type: decode_enum(r, "alert_type")?,
                audio_url: r.try_get("audio_url")?,
                created_at: r.try_get("created_at")?,
                expires_at: r.try_get("expires_at")?,
            })
        })
        .collect()
}
