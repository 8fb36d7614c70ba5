use axum::extract::State;
use axum::Json;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::reports::{self, VoiceMetadata};
use crate::db::users;
use crate::models::advisory::{
    LocationTipsRequest, LocationTipsResponse, VoiceReportRequest, VoiceReportResponse,
};
use crate::models::report::{PollutionReport, ReportSource};
use crate::models::user::UserProfile;
use crate::routes::error::{ApiResponse, ApiResult};
use crate::routes::extract::ApiJson;
use crate::services::{advisor, geocoding, nearby, voice_analysis};

/// Profile for personalizing guidance. Lookup failures only cost the
/// personalization, so they are logged and treated as an unknown user.
pub(crate) async fn optional_profile(state: &AppState, user_id: &str) -> Option<UserProfile> {
    match users::get_user(&state.db, &state.encryption, user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Profile lookup failed, continuing without it");
            None
        }
    }
}

/// POST /api/v1/assistant/location-tips
pub async fn location_tips(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LocationTipsRequest>,
) -> ApiResult<Json<ApiResponse<LocationTipsResponse>>> {
    request.validate()?;

    let location = geocoding::locate(state.geocoder.as_ref(), request.latitude, request.longitude).await;
    let nearby_pollution = nearby::nearby_or_empty(
        state.records.as_ref(),
        &state.proximity,
        request.latitude,
        request.longitude,
    )
    .await;
    let profile = optional_profile(&state, &request.user_id).await;

    let tips = advisor::location_tips(
        state.text.as_ref(),
        profile.as_ref(),
        &location,
        None,
        &nearby_pollution,
    )
    .await;

    tracing::info!(
        user_id = %request.user_id,
        place = location.display_name(),
        nearby = nearby_pollution.len(),
        generated_by = %tips.generated_by,
        "Location tips generated"
    );

    Ok(ApiResponse::ok(LocationTipsResponse {
        location,
        nearby_pollution,
        tips,
    }))
}

/// POST /api/v1/assistant/voice-report
pub async fn voice_report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VoiceReportRequest>,
) -> ApiResult<Json<ApiResponse<VoiceReportResponse>>> {
    request.validate()?;
    let point = request.location;

    let location = geocoding::locate(state.geocoder.as_ref(), point.latitude, point.longitude).await;
    let analysis = voice_analysis::analyze_transcription(state.text.as_ref(), &request.voice_transcription).await;
    let nearby_pollution =
        nearby::nearby_or_empty(state.records.as_ref(), &state.proximity, point.latitude, point.longitude).await;
    let profile = optional_profile(&state, &request.user_id).await;

    let tips = advisor::location_tips(
        state.text.as_ref(),
        profile.as_ref(),
        &location,
        Some(&analysis),
        &nearby_pollution,
    )
    .await;

    // Spoken reports are confirmed by the caller, so they skip the pending state.
    let report = PollutionReport {
        id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        latitude: Some(point.latitude),
        longitude: Some(point.longitude),
        address: location.formatted_address.clone(),
        barangay: location.barangay.clone(),
        city: location.city.clone(),
        pollution_type: analysis.pollution_type,
        severity: analysis.severity,
        description: request.voice_transcription,
        image_url: None,
        source: ReportSource::Voice,
        status: "verified".to_string(),
        is_verified: true,
        created_at: Utc::now(),
    };

    let voice = VoiceMetadata {
        session_id: request.session_id.as_deref(),
        recording_url: request.recording_url.as_deref(),
    };
    reports::insert_report(&state.db, &report, voice).await?;
    metrics::counter!("reports_created_total", "source" => report.source.to_string()).increment(1);

    tracing::info!(
        report_id = %report.id,
        pollution_type = %analysis.pollution_type,
        severity = %analysis.severity,
        confidence = analysis.confidence,
        "Voice report created"
    );

    Ok(ApiResponse::ok(VoiceReportResponse {
        report_id: report.id,
        location,
        analysis,
        tips,
        nearby_pollution,
    }))
}
