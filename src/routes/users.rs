use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::alerts;
use crate::db::users;
use crate::models::advisory::HealthAlert;
use crate::models::user::{ProfileUpdate, SignupRequest, SignupResponse, UserProfile};
use crate::routes::error::{ApiError, ApiResponse, ApiResult};
use crate::routes::extract::ApiJson;
use crate::services::identity::IdentityError;

/// POST /api/v1/users
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SignupResponse>>)> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    let user_id = match state
        .identity
        .create_user(&email, &request.password, &request.name)
        .await
    {
        Ok(uid) => uid,
        Err(IdentityError::NotConfigured) => {
            tracing::warn!("Identity provider not configured, storing profile only");
            Uuid::new_v4().to_string()
        }
        Err(e) => return Err(e.into()),
    };

    let profile = UserProfile {
        user_id,
        email,
        name: request.name,
        health_conditions: request.health_conditions,
        barangay: request.barangay,
        city: request.city,
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    };
    users::insert_user(&state.db, &state.encryption, &profile).await?;

    tracing::info!(user_id = %profile.user_id, "User registered");

    Ok(ApiResponse::created(SignupResponse {
        user_id: profile.user_id,
        email: profile.email,
    }))
}

/// GET /api/v1/users/{user_id}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let profile = users::get_user(&state.db, &state.encryption, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(profile))
}

/// PUT /api/v1/users/{user_id}
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    update.validate()?;
    if update.is_empty() {
        return Err(ApiError::bad_request("No updatable fields provided"));
    }

    let profile = users::update_user(&state.db, &state.encryption, &user_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    tracing::info!(user_id = %user_id, "Profile updated");
    Ok(ApiResponse::ok(profile))
}

/// GET /api/v1/users/{user_id}/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<HealthAlert>>>> {
    let alerts = alerts::active_alerts(&state.db, &user_id).await?;
    Ok(ApiResponse::ok(alerts))
}
