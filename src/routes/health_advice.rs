use axum::extract::State;
use axum::Json;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::alerts::{self, expiry_for};
use crate::models::advisory::{
    AdviceRequest, AdviceResponse, AlertType, EmergencyAlertRequest, EmergencyAlertResponse,
    GeoPoint, HealthAlert, VoiceSessionRequest, VoiceSessionResponse,
};
use crate::models::report::{NearbyReport, Severity};
use crate::routes::assistant::optional_profile;
use crate::routes::error::{ApiError, ApiResponse, ApiResult};
use crate::routes::extract::ApiJson;
use crate::services::{advisor, geocoding, nearby};

async fn nearby_for(state: &AppState, point: Option<GeoPoint>) -> Vec<NearbyReport> {
    match point {
        Some(p) => nearby::nearby_or_empty(state.records.as_ref(), &state.proximity, p.latitude, p.longitude).await,
        None => Vec::new(),
    }
}

fn new_alert(
    user_id: &str,
    advice: &str,
    severity: Severity,
    point: Option<GeoPoint>,
    alert_type: AlertType,
    audio_url: &str,
) -> HealthAlert {
    let created_at = Utc::now();
    HealthAlert {
        alert_id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        advice: advice.to_string(),
        severity,
        latitude: point.map(|p| p.latitude),
        longitude: point.map(|p| p.longitude),
        alert_type,
        audio_url: Some(audio_url.to_string()),
        created_at,
        expires_at: expiry_for(created_at),
    }
}

/// POST /api/v1/health/voice-session
pub async fn voice_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VoiceSessionRequest>,
) -> ApiResult<Json<ApiResponse<VoiceSessionResponse>>> {
    request.validate()?;

    let profile = optional_profile(&state, &request.user_id)
        .await
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let nearby_pollution = nearby_for(&state, request.location).await;
    let place = match request.location {
        Some(p) => geocoding::locate(state.geocoder.as_ref(), p.latitude, p.longitude)
            .await
            .display_name()
            .to_string(),
        None => profile
            .barangay
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "your area".to_string()),
    };

    let advice = advisor::health_advice(
        state.text.as_ref(),
        &profile,
        &place,
        &nearby_pollution,
        request.trigger_reason,
    )
    .await;
    let audio_url = advisor::speak(state.speech.as_ref(), &state.storage, &profile.user_id, &advice.spoken_text).await?;

    let alert = new_alert(
        &profile.user_id,
        &advice.spoken_text,
        advice.severity,
        request.location,
        AlertType::VoiceSession,
        &audio_url,
    );
    alerts::insert_alert(&state.db, &alert).await?;

    tracing::info!(
        user_id = %profile.user_id,
        alert_id = %alert.alert_id,
        trigger = %request.trigger_reason,
        severity = %advice.severity,
        "Voice health session started"
    );

    Ok(ApiResponse::ok(VoiceSessionResponse {
        alert_id: alert.alert_id,
        advice,
        audio_url,
        nearby_pollution,
    }))
}

/// POST /api/v1/health/advice
pub async fn advice(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdviceRequest>,
) -> ApiResult<Json<ApiResponse<AdviceResponse>>> {
    request.validate()?;

    let profile = optional_profile(&state, &request.user_id).await;
    let nearby_pollution = nearby_for(&state, request.location).await;

    let spoken_text =
        advisor::contextual_response(state.text.as_ref(), profile.as_ref(), &nearby_pollution, &request.query).await;
    let audio_url = advisor::speak(state.speech.as_ref(), &state.storage, &request.user_id, &spoken_text).await?;

    Ok(ApiResponse::ok(AdviceResponse { spoken_text, audio_url }))
}

/// POST /api/v1/health/emergency-alert
pub async fn emergency_alert(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmergencyAlertRequest>,
) -> ApiResult<Json<ApiResponse<EmergencyAlertResponse>>> {
    request.validate()?;

    let profile = optional_profile(&state, &request.user_id).await;
    let name = profile.as_ref().map_or("there", |p| p.first_name());

    let message = advisor::emergency_message(name, &request.pollution_report);
    let audio_url = advisor::speak(state.speech.as_ref(), &state.storage, &request.user_id, &message).await?;

    let alert = new_alert(
        &request.user_id,
        &message,
        Severity::Critical,
        request.location,
        AlertType::EmergencyAlert,
        &audio_url,
    );
    alerts::insert_alert(&state.db, &alert).await?;

    tracing::warn!(
        user_id = %request.user_id,
        alert_id = %alert.alert_id,
        pollution_type = %request.pollution_report.pollution_type,
        distance_km = request.pollution_report.distance_km,
        "Emergency alert sent"
    );

    Ok(ApiResponse::ok(EmergencyAlertResponse {
        alert_id: alert.alert_id,
        message,
        audio_url,
    }))
}
