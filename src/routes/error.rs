use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

use crate::db::users::UserStoreError;
use crate::services::advisor::SpeakError;
use crate::services::identity::IdentityError;
use crate::services::nearby::NearbyError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error rendered as `{"success": false, "error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unsupported_media(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));

        (self.status, body).into_response()
    }
}

/// Success envelope `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

/// Malformed bodies are validation errors; oversized or non-JSON bodies keep their status.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            status @ (StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE) => status,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        Self::bad_request(report.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = ?err, "Database operation failed");
        Self::internal("Database operation failed")
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::DuplicateEmail => Self::conflict("User already exists"),
            UserStoreError::Database(e) => e.into(),
            UserStoreError::Encryption(e) => {
                tracing::error!(error = %e, "Profile encryption failed");
                Self::internal("Failed to process profile")
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::AlreadyExists(_) => Self::conflict("User already exists"),
            other => {
                tracing::error!(error = %other, "Identity provider call failed");
                Self::internal("Failed to create account")
            }
        }
    }
}

impl From<NearbyError> for ApiError {
    fn from(err: NearbyError) -> Self {
        match err {
            NearbyError::Proximity(e) => Self::bad_request(e.to_string()),
            NearbyError::Database(e) => e.into(),
        }
    }
}

impl From<SpeakError> for ApiError {
    fn from(err: SpeakError) -> Self {
        tracing::error!(error = %err, "Audio generation failed");
        Self::internal("Failed to generate audio")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::proximity::ProximityError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = ApiError::not_found("User not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "success": false, "error": "User not found" })
        );
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let (status, Json(body)) = ApiResponse::created(json!({ "report_id": "r1" }));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({ "success": true, "data": { "report_id": "r1" } })
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(UserStoreError::DuplicateEmail).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(NearbyError::Proximity(ProximityError::InvalidLimit)).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(sqlx::Error::PoolClosed).status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
