use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use garde::Validate;
use image::ImageFormat;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{reports, runs};
use crate::models::orchestration::ProcessingStep;
use crate::models::report::{
    CreateReportRequest, CreateReportResponse, NearbyQuery, NearbyReport, PollutionReport,
    ReportFilter, ReportList, ReportSource,
};
use crate::routes::error::{ApiError, ApiResponse, ApiResult};
use crate::routes::extract::{ApiJson, ApiQuery};
use crate::services::nearby;
use crate::services::queue::ReportEvent;
use crate::services::storage::report_image_key;

/// A decoded report photo ready for upload.
#[derive(Debug)]
pub struct ReportImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub content_type: &'static str,
}

/// Decode a base64 photo, accepting an optional `data:` URL prefix.
pub fn decode_image(encoded: &str) -> ApiResult<ReportImage> {
    let payload = encoded
        .split_once(";base64,")
        .map_or(encoded, |(_, data)| data)
        .trim();

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| ApiError::bad_request("image_base64 is not valid base64"))?;

    let (extension, content_type) = match image::guess_format(&bytes) {
        Ok(ImageFormat::Jpeg) => ("jpg", "image/jpeg"),
        Ok(ImageFormat::Png) => ("png", "image/png"),
        Ok(ImageFormat::WebP) => ("webp", "image/webp"),
        _ => return Err(ApiError::unsupported_media("Image must be JPEG, PNG or WebP")),
    };

    Ok(ReportImage {
        bytes,
        extension,
        content_type,
    })
}

/// POST /api/v1/reports
pub async fn create_report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateReportRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreateReportResponse>>)> {
    request.validate()?;

    let report_id = Uuid::new_v4().to_string();
    let image = request.image_base64.as_deref().map(decode_image).transpose()?;

    let image_url = match image {
        Some(img) => {
            let key = report_image_key(&report_id, img.extension);
            match state.storage.upload(&key, &img.bytes, img.content_type).await {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(report_id = %report_id, error = %e, "Image upload failed, continuing without image");
                    None
                }
            }
        }
        None => None,
    };

    let location = request.location;
    let report = PollutionReport {
        id: report_id,
        user_id: request.user_id,
        latitude: Some(location.latitude),
        longitude: Some(location.longitude),
        address: location.address.unwrap_or_default(),
        barangay: location.barangay.unwrap_or_default(),
        city: location.city.unwrap_or_default(),
        pollution_type: request.pollution_type,
        severity: request.severity,
        description: request.description.unwrap_or_default(),
        image_url,
        source: ReportSource::MobileApp,
        status: "pending".to_string(),
        is_verified: false,
        created_at: Utc::now(),
    };

    reports::insert_report(&state.db, &report, Default::default()).await?;
    metrics::counter!("reports_created_total", "source" => report.source.to_string()).increment(1);

    tracing::info!(
        report_id = %report.id,
        pollution_type = %report.pollution_type,
        severity = %report.severity,
        has_image = report.image_url.is_some(),
        "Report created"
    );

    enqueue_for_processing(&state, &report).await;

    Ok(ApiResponse::created(CreateReportResponse {
        report_id: report.id,
        created_at: report.created_at,
        image_url: report.image_url,
        status: report.status,
    }))
}

/// Hand a stored report to the orchestration worker. Failures are logged
/// only; the report is already persisted.
async fn enqueue_for_processing(state: &AppState, report: &PollutionReport) {
    let event = ReportEvent {
        report_id: report.id.clone(),
        created_at: report.created_at,
    };
    if let Err(e) = state.queue.enqueue(&event).await {
        tracing::warn!(report_id = %report.id, error = %e, "Failed to enqueue report for orchestration");
    }
}

/// GET /api/v1/reports
pub async fn list_reports(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ReportFilter>,
) -> ApiResult<Json<ApiResponse<ReportList>>> {
    let reports = reports::list_reports(&state.db, &filter).await?;
    Ok(ApiResponse::ok(ReportList {
        count: reports.len(),
        reports,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReportDetail {
    pub report: PollutionReport,
    pub processing: Option<ProcessingDetail>,
}

#[derive(Debug, Serialize)]
pub struct ProcessingDetail {
    pub status: String,
    pub steps: Vec<ProcessingStep>,
}

/// GET /api/v1/reports/{report_id}
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReportDetail>>> {
    let report = reports::get_report(&state.db, &report_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found"))?;

    let processing = runs::latest_run(&state.db, &report_id)
        .await?
        .map(|(status, steps)| ProcessingDetail { status, steps });

    Ok(ApiResponse::ok(ReportDetail { report, processing }))
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub count: usize,
    pub radius_km: f64,
    pub reports: Vec<NearbyReport>,
}

/// GET /api/v1/reports/nearby
pub async fn nearby_reports(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NearbyQuery>,
) -> ApiResult<Json<ApiResponse<NearbyResponse>>> {
    let radius_km = query.radius_km.unwrap_or(state.proximity.radius_km);
    let limit = query.limit.unwrap_or(state.proximity.max_results);

    let reports = nearby::search(
        state.records.as_ref(),
        &state.proximity,
        query.latitude,
        query.longitude,
        radius_km,
        limit,
    )
    .await?;

    Ok(ApiResponse::ok(NearbyResponse {
        count: reports.len(),
        radius_km,
        reports,
    }))
}
