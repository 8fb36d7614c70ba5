use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::user::{ProfileUpdate, UserProfile};
use crate::services::encryption::{EncryptionError, EncryptionService};

const USER_COLUMNS: &str =
    "user_id, email, name, health_conditions, barangay, city, is_active, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Health conditions could not be sealed or opened: {0}")]
    Encryption(#[from] EncryptionError),
}

/// Insert a new user profile. Health conditions are stored sealed.
pub async fn insert_user(
    pool: &PgPool,
    encryption: &EncryptionService,
    profile: &UserProfile,
) -> Result<(), UserStoreError> {
    let sealed = encryption.seal(&profile.health_conditions)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (user_id, email, name, health_conditions, barangay, city, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&profile.user_id)
    .bind(&profile.email)
    .bind(&profile.name)
    .bind(sealed)
    .bind(&profile.barangay)
    .bind(&profile.city)
    .bind(profile.is_active)
    .bind(profile.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UserStoreError::DuplicateEmail),
        Err(e) => Err(e.into()),
    }
}

/// Get a user profile by ID
pub async fn get_user(
    pool: &PgPool,
    encryption: &EncryptionService,
    user_id: &str,
) -> Result<Option<UserProfile>, UserStoreError> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| user_from_row(&r, encryption)).transpose()
}

/// Apply a partial update, returning the updated profile or `None` if the
/// user does not exist.
pub async fn update_user(
    pool: &PgPool,
    encryption: &EncryptionService,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<Option<UserProfile>, UserStoreError> {
    let sealed = update
        .health_conditions
        .as_ref()
        .map(|c| encryption.seal(c))
        .transpose()?;

    let row = sqlx::query(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            health_conditions = COALESCE($3, health_conditions),
            barangay = COALESCE($4, barangay),
            city = COALESCE($5, city),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&update.name)
    .bind(sealed)
    .bind(&update.barangay)
    .bind(&update.city)
    .fetch_optional(pool)
    .await?;

    row.map(|r| user_from_row(&r, encryption)).transpose()
}

fn user_from_row(row: &PgRow, encryption: &EncryptionService) -> Result<UserProfile, UserStoreError> {
    let sealed: String = row.try_get("health_conditions")?;

    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        health_conditions: encryption.open(&sealed)?,
        barangay: row.try_get("barangay")?,
        city: row.try_get("city")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
