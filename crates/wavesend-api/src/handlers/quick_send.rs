//! Quick send handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::{bad_request, campaign_error, ApiError};
use crate::handlers::campaigns::CampaignResponse;
use crate::state::AppState;
use wavesend_core::QuickSendRequest;

#[derive(Debug, Deserialize)]
pub struct QuickSendBody {
    pub name: Option<String>,
    pub text: String,
    #[serde(default)]
    pub contact_ids: Vec<Uuid>,
    pub contact_list_id: Option<Uuid>,
}

/// Send a one-off text to an ad-hoc recipient set, as an immediately
/// scheduled one-day campaign.
///
/// POST /api/v1/quick-send
pub async fn quick_send(
    State(state): State<AppState>,
    Json(input): Json<QuickSendBody>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    if input.text.trim().is_empty() {
        return Err(bad_request("Message text is required"));
    }
    if input.contact_ids.is_empty() && input.contact_list_id.is_none() {
        return Err(bad_request("At least one recipient is required"));
    }

    let campaign = state
        .manager
        .quick_send(QuickSendRequest {
            name: input.name,
            text: input.text,
            contact_ids: input.contact_ids,
            contact_list_id: input.contact_list_id,
        })
        .await
        .map_err(campaign_error)?;

    Ok((StatusCode::CREATED, Json(campaign.into())))
}
