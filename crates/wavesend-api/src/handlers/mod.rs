//! Request handlers

pub mod campaigns;
pub mod contact_lists;
pub mod contacts;
pub mod health;
pub mod messages;
pub mod quick_send;
pub mod settings;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;
use wavesend_core::CampaignError;
use wavesend_storage::store::StoreError;

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "validation_error".to_string(),
            message: message.into(),
        }),
    )
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".to_string(),
            message: message.into(),
        }),
    )
}

pub fn conflict(message: impl Into<String>) -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: "invalid_state".to_string(),
            message: message.into(),
        }),
    )
}

pub fn internal_error(e: StoreError) -> ApiError {
    error!("store error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal_error".to_string(),
            message: "Internal server error".to_string(),
        }),
    )
}

pub fn campaign_error(e: CampaignError) -> ApiError {
    match e {
        CampaignError::NotFound => not_found("Campaign not found"),
        CampaignError::InvalidState { .. } => conflict(e.to_string()),
        CampaignError::NoContactList | CampaignError::EmptyContactList => {
            bad_request(e.to_string())
        }
        CampaignError::Store(inner) => internal_error(inner),
    }
}

fn default_limit() -> i64 {
    50
}

fn default_offset() -> i64 {
    0
}
